// Shared data model for hotels, rooms, bookings and search state.
// Field names serialize in camelCase to match the backend and the persisted JSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    pub city: String,
    pub country: String,
}

// Invariant: min <= max
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub min: u64,
    pub max: u64,
    pub currency: String,
}

impl PriceRange {
    pub fn new(min: u64, max: u64, currency: &str) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
            currency: currency.to_string(),
        }
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::new(0, 0, DEFAULT_CURRENCY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelPolicies {
    pub check_in: String,
    pub check_out: String,
    pub cancellation: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub star_rating: u8,
    #[serde(default)]
    pub price_range: PriceRange,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<HotelPolicies>,
}

impl Hotel {
    pub fn has_amenity(&self, amenity: &str) -> bool {
        self.amenities.iter().any(|a| a == amenity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    #[default]
    Standard,
    Deluxe,
    Suite,
    Premium,
    Luxury,
    // Owner-defined room types the catalog does not know about
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    pub adults: u32,
    pub children: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub hotel_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub room_type: RoomType,
    #[serde(default)]
    pub images: Vec<String>,
    pub capacity: Capacity,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub price_per_night: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub total_rooms: u32,
    pub available_rooms: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bed_type: Option<String>,
}

impl Room {
    pub fn is_available(&self) -> bool {
        self.available_rooms > 0
    }
}

// Body of `POST /hotels/{id}/rooms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoom {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub capacity: Capacity,
    pub amenities: Vec<String>,
    pub price_per_night: u64,
    pub total_rooms: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guests {
    pub adults: u32,
    pub children: u32,
}

impl Default for Guests {
    fn default() -> Self {
        Self {
            adults: 2,
            children: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub hotel_id: String,
    pub room_id: String,
    pub hotel: Hotel,
    pub room: Room,
    pub check_in: String,
    pub check_out: String,
    pub guests: Guests,
    pub total_price: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    pub guest_details: GuestDetails,
    pub payment_status: PaymentStatus,
    pub created_at: String,
    pub updated_at: String,
}

// Body of `POST /bookings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub hotel_id: String,
    pub room_id: String,
    pub check_in: String,
    pub check_out: String,
    pub guests: Guests,
    pub guest_details: GuestDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFilter {
    pub min: u64,
    pub max: u64,
}

// Search state owned by the caller's session; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub location: String,
    pub check_in: String,
    pub check_out: String,
    pub guests: Guests,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star_rating: Option<u8>,
}

// Partial update applied by `SearchFilters::update`; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct SearchFiltersUpdate {
    pub location: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub guests: Option<Guests>,
    pub price_range: Option<Option<PriceFilter>>,
    pub rating: Option<Option<f64>>,
    pub amenities: Option<Vec<String>>,
    pub star_rating: Option<Option<u8>>,
}

impl SearchFilters {
    pub fn update(&mut self, update: SearchFiltersUpdate) {
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(check_in) = update.check_in {
            self.check_in = check_in;
        }
        if let Some(check_out) = update.check_out {
            self.check_out = check_out;
        }
        if let Some(guests) = update.guests {
            self.guests = guests;
        }
        if let Some(price_range) = update.price_range {
            self.price_range = price_range;
        }
        if let Some(rating) = update.rating {
            self.rating = rating;
        }
        if let Some(amenities) = update.amenities {
            self.amenities = amenities;
        }
        if let Some(star_rating) = update.star_rating {
            self.star_rating = star_rating;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn has_dates(&self) -> bool {
        !self.check_in.is_empty() && !self.check_out.is_empty()
    }
}

pub const DEFAULT_CURRENCY: &str = "INR";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}
