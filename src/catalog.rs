// Catalog provider: remote hotel/room data with a static local dataset behind it.
//
// The local dataset is what the booking store synthesizes fallback bookings
// from, so its ids must stay stable: hotels are `hotel_<n>` and rooms are
// `<hotel id>-room-<n>`.

use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::api::{ApiError, HotelApi};
use crate::booking_store::BookingError;
use crate::catalog_cache::{hotel_key, rooms_key, CatalogCache, CacheStats, HOTELS_KEY};
use crate::models::{
    Capacity, Hotel, HotelPolicies, Location, NewRoom, PriceRange, Room, RoomType,
    DEFAULT_CURRENCY,
};

struct RoomTemplate {
    name: &'static str,
    room_type: RoomType,
    description: &'static str,
    bed_type: &'static str,
    size: u32,
    price_multiplier: f64,
    total_rooms: u32,
    available_rooms: u32,
}

const ROOM_TEMPLATES: [RoomTemplate; 5] = [
    RoomTemplate {
        name: "Deluxe Room",
        room_type: RoomType::Deluxe,
        description: "Comfortable room with modern amenities and city views",
        bed_type: "King Bed",
        size: 28,
        price_multiplier: 1.0,
        total_rooms: 10,
        available_rooms: 6,
    },
    RoomTemplate {
        name: "Executive Suite",
        room_type: RoomType::Suite,
        description: "Spacious suite with separate living area and premium amenities",
        bed_type: "King Bed",
        size: 45,
        price_multiplier: 2.2,
        total_rooms: 5,
        available_rooms: 2,
    },
    RoomTemplate {
        name: "Premium Room",
        room_type: RoomType::Premium,
        description: "Elegant room with premium furnishings and enhanced services",
        bed_type: "Queen Bed",
        size: 32,
        price_multiplier: 1.5,
        total_rooms: 8,
        available_rooms: 5,
    },
    RoomTemplate {
        name: "Luxury Suite",
        room_type: RoomType::Luxury,
        description: "Opulent suite with breathtaking views and exclusive privileges",
        bed_type: "King Bed",
        size: 55,
        price_multiplier: 3.0,
        total_rooms: 3,
        available_rooms: 1,
    },
    RoomTemplate {
        name: "Standard Room",
        room_type: RoomType::Standard,
        description: "Well-appointed room with essential amenities",
        bed_type: "Double Bed",
        size: 22,
        price_multiplier: 0.8,
        total_rooms: 15,
        available_rooms: 10,
    },
];

const ROOM_AMENITIES: [&str; 5] = ["WiFi", "Air Conditioning", "TV", "Mini Bar", "Room Service"];

const ROOM_IMAGES: [&str; 2] = [
    "https://images.unsplash.com/photo-1631049307264-da0ec9d70304?w=800",
    "https://images.unsplash.com/photo-1590490360182-c33d57733427?w=800",
];

// (id, name, address, city, stars, rating, reviews, min, max, amenities)
type HotelRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    u8,
    f64,
    u32,
    u64,
    u64,
    &'static [&'static str],
);

const LOCAL_HOTELS: [HotelRow; 12] = [
    ("hotel_001", "The Taj Mahal Palace", "Apollo Bunder, Colaba", "Mumbai", 5, 4.8, 3120, 24000, 85000,
        &["WiFi", "Pool", "Spa", "Gym", "Restaurant", "Bar", "Parking", "Business Center"]),
    ("hotel_002", "The Leela Palace", "Diplomatic Enclave, Chanakyapuri", "Delhi", 5, 4.7, 2480, 18000, 60000,
        &["WiFi", "Pool", "Spa", "Gym", "Restaurant", "Bar", "Business Center"]),
    ("hotel_003", "ITC Gardenia", "Residency Road", "Bangalore", 5, 4.6, 1890, 12000, 40000,
        &["WiFi", "Pool", "Spa", "Gym", "Restaurant", "Bar", "Parking"]),
    ("hotel_004", "Marina Bay Residency", "Kamarajar Salai", "Chennai", 4, 4.3, 940, 6500, 16000,
        &["WiFi", "Pool", "Restaurant", "Parking", "Beach"]),
    ("hotel_005", "Charminar Heritage Inn", "Pathergatti Road", "Hyderabad", 3, 4.1, 610, 3200, 8000,
        &["WiFi", "Restaurant", "Parking"]),
    ("hotel_006", "Rambagh Palace", "Bhawani Singh Road", "Jaipur", 5, 4.9, 2050, 36000, 120000,
        &["WiFi", "Pool", "Spa", "Restaurant", "Bar", "Parking"]),
    ("hotel_007", "Candolim Beach Resort", "Candolim Beach Road", "Goa", 4, 4.4, 1320, 7500, 22000,
        &["WiFi", "Pool", "Beach", "Restaurant", "Bar", "Spa"]),
    ("hotel_008", "Park Street Suites", "Park Street", "Kolkata", 4, 4.2, 780, 5500, 14000,
        &["WiFi", "Gym", "Restaurant", "Business Center"]),
    ("hotel_009", "Koregaon Park Inn", "North Main Road", "Pune", 3, 4.0, 450, 2800, 7000,
        &["WiFi", "Parking", "Restaurant"]),
    ("hotel_010", "Oberoi Amarvilas", "Taj East Gate Road", "Agra", 5, 4.9, 1760, 42000, 150000,
        &["WiFi", "Pool", "Spa", "Gym", "Restaurant", "Bar"]),
    ("hotel_011", "Lake Pichola Retreat", "Lal Ghat", "Udaipur", 4, 4.5, 990, 9500, 30000,
        &["WiFi", "Pool", "Spa", "Restaurant"]),
    ("hotel_012", "Backwater Bay Hotel", "Marine Drive", "Kochi", 3, 4.1, 520, 4200, 9000,
        &["WiFi", "Restaurant", "Parking", "Beach"]),
];

fn generate_rooms(hotel_id: &str, base_price: u64) -> Vec<Room> {
    ROOM_TEMPLATES
        .iter()
        .enumerate()
        .map(|(index, template)| {
            let roomy = matches!(template.room_type, RoomType::Suite | RoomType::Luxury);
            Room {
                id: format!("{hotel_id}-room-{}", index + 1),
                hotel_id: hotel_id.to_string(),
                name: template.name.to_string(),
                description: template.description.to_string(),
                room_type: template.room_type,
                images: ROOM_IMAGES.iter().map(|s| s.to_string()).collect(),
                capacity: Capacity {
                    adults: if roomy { 3 } else { 2 },
                    children: if roomy { 2 } else { 1 },
                },
                amenities: ROOM_AMENITIES.iter().map(|s| s.to_string()).collect(),
                price_per_night: (base_price as f64 * template.price_multiplier).round() as u64,
                currency: DEFAULT_CURRENCY.to_string(),
                total_rooms: template.total_rooms,
                available_rooms: template.available_rooms,
                size: Some(template.size),
                bed_type: Some(template.bed_type.to_string()),
            }
        })
        .collect()
}

fn build_hotel(row: &HotelRow) -> Hotel {
    let (id, name, address, city, stars, rating, reviews, min, max, amenities) = *row;
    Hotel {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{stars}-star stay in {city} at {address}."),
        location: Location {
            address: address.to_string(),
            city: city.to_string(),
            country: "India".to_string(),
        },
        images: vec![],
        amenities: amenities.iter().map(|s| s.to_string()).collect(),
        rating,
        review_count: reviews,
        star_rating: stars,
        price_range: PriceRange::new(min, max, DEFAULT_CURRENCY),
        rooms: vec![],
        policies: Some(HotelPolicies {
            check_in: "14:00".to_string(),
            check_out: "12:00".to_string(),
            cancellation: "Free cancellation up to 24 hours before check-in".to_string(),
        }),
    }
}

/// The static catalog bundled with the client.
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    hotels: Vec<Hotel>,
    rooms: Vec<Vec<Room>>,
}

impl Default for LocalCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalCatalog {
    pub fn new() -> Self {
        let hotels: Vec<Hotel> = LOCAL_HOTELS.iter().map(build_hotel).collect();
        let rooms = hotels
            .iter()
            .map(|hotel| generate_rooms(&hotel.id, hotel.price_range.min))
            .collect();
        Self { hotels, rooms }
    }

    // Arbitrary catalogs, mostly for tests
    pub fn from_parts(hotels: Vec<Hotel>, rooms: Vec<Vec<Room>>) -> Self {
        Self { hotels, rooms }
    }

    pub fn hotels(&self) -> &[Hotel] {
        &self.hotels
    }

    pub fn hotel(&self, id: &str) -> Option<&Hotel> {
        self.hotels.iter().find(|hotel| hotel.id == id)
    }

    // Unknown hotels have no rooms
    pub fn rooms(&self, hotel_id: &str) -> &[Room] {
        let rooms = self
            .hotels
            .iter()
            .position(|hotel| hotel.id == hotel_id)
            .and_then(|pos| self.rooms.get(pos));

        match rooms {
            Some(rooms) => rooms,
            None => &[],
        }
    }

    pub fn room(&self, hotel_id: &str, room_id: &str) -> Option<&Room> {
        self.rooms(hotel_id).iter().find(|room| room.id == room_id)
    }
}

#[derive(Debug, Clone)]
enum Cached {
    Hotels(Vec<Hotel>),
    Hotel(Hotel),
    Rooms(Vec<Room>),
}

/// Serves catalog reads from the backend, caching responses, and answers
/// single-hotel and room lookups from the local dataset when the backend fails.
pub struct CatalogProvider {
    remote: Arc<dyn HotelApi>,
    local: LocalCatalog,
    cache: CatalogCache<Cached>,
}

impl CatalogProvider {
    pub fn new(remote: Arc<dyn HotelApi>, local: LocalCatalog, ttl: Duration) -> Self {
        Self {
            remote,
            local,
            cache: CatalogCache::new(ttl),
        }
    }

    pub fn local(&self) -> &LocalCatalog {
        &self.local
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // The hotel list has no local fallback; callers show the error with a retry
    pub async fn hotels(&self) -> Result<Vec<Hotel>, ApiError> {
        if let Some(Cached::Hotels(hotels)) = self.cache.get(HOTELS_KEY) {
            debug!("hotel list served from cache");
            return Ok(hotels);
        }

        let hotels = self.remote.hotels().await?;
        self.cache
            .store(HOTELS_KEY, Cached::Hotels(hotels.clone()), None);
        Ok(hotels)
    }

    pub async fn hotel(&self, id: &str) -> Result<Hotel, BookingError> {
        let key = hotel_key(id);
        if let Some(Cached::Hotel(hotel)) = self.cache.get(&key) {
            return Ok(hotel);
        }

        match self.remote.hotel(id).await {
            Ok(hotel) => {
                self.cache.store(&key, Cached::Hotel(hotel.clone()), None);
                Ok(hotel)
            }
            Err(e) => {
                warn!(hotel_id = id, error = %e, "hotel lookup failed, using local catalog");
                self.local
                    .hotel(id)
                    .cloned()
                    .ok_or_else(|| BookingError::NotFound(format!("hotel {id}")))
            }
        }
    }

    pub async fn rooms(&self, hotel_id: &str) -> Vec<Room> {
        let key = rooms_key(hotel_id);
        if let Some(Cached::Rooms(rooms)) = self.cache.get(&key) {
            return rooms;
        }

        match self.remote.rooms(hotel_id).await {
            Ok(rooms) => {
                self.cache.store(&key, Cached::Rooms(rooms.clone()), None);
                rooms
            }
            Err(e) => {
                warn!(hotel_id, error = %e, "room lookup failed, using local catalog");
                self.local.rooms(hotel_id).to_vec()
            }
        }
    }

    // Hotel detail view: both lookups run concurrently
    pub async fn hotel_with_rooms(&self, id: &str) -> Result<(Hotel, Vec<Room>), BookingError> {
        let (hotel, rooms) = futures::join!(self.hotel(id), self.rooms(id));
        Ok((hotel?, rooms))
    }

    pub async fn create_room(&self, hotel_id: &str, room: &NewRoom) -> Result<Room, ApiError> {
        let created = self.remote.create_room(hotel_id, room).await?;
        self.cache.invalidate_hotel(hotel_id);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_backend::{BackendMode, MockBackend};

    fn provider(backend: Arc<MockBackend>) -> CatalogProvider {
        CatalogProvider::new(backend, LocalCatalog::new(), Duration::from_secs(60))
    }

    #[test]
    fn test_local_rooms_follow_price_multipliers() {
        let catalog = LocalCatalog::new();
        let hotel = catalog.hotel("hotel_004").unwrap();
        let rooms = catalog.rooms(&hotel.id);

        let prices: Vec<u64> = rooms.iter().map(|r| r.price_per_night).collect();
        assert_eq!(prices, vec![6500, 14300, 9750, 19500, 5200]);
        assert_eq!(rooms[0].id, "hotel_004-room-1");
        assert_eq!(rooms[1].capacity, Capacity { adults: 3, children: 2 });
        assert!(rooms
            .iter()
            .all(|r| r.available_rooms <= r.total_rooms && r.is_available()));
    }

    #[test]
    fn test_local_catalog_invariants() {
        let catalog = LocalCatalog::new();
        for hotel in catalog.hotels() {
            assert!(hotel.price_range.min <= hotel.price_range.max);
            assert!((3..=5).contains(&hotel.star_rating));
            assert_eq!(catalog.rooms(&hotel.id).len(), 5);
        }
        assert!(catalog.rooms("ghost").is_empty());
        assert!(catalog.room("hotel_001", "hotel_002-room-1").is_none());
    }

    #[tokio::test]
    async fn test_hotel_falls_back_to_local_catalog() {
        let backend = Arc::new(MockBackend::new());
        backend.set_mode(BackendMode::CompleteOutage);
        let provider = provider(backend);

        let hotel = provider.hotel("hotel_007").await.unwrap();
        assert_eq!(hotel.location.city, "Goa");

        let rooms = provider.rooms("hotel_007").await;
        assert_eq!(rooms.len(), 5);

        assert!(matches!(
            provider.hotel("ghost").await,
            Err(BookingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_hotel_list_is_cached() {
        let backend = Arc::new(MockBackend::new());
        let provider = provider(backend.clone());

        let first = provider.hotels().await.unwrap();
        let second = provider.hotels().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.request_count(), 1);
        assert_eq!(provider.cache_stats().hit_count, 1);
    }

    #[tokio::test]
    async fn test_hotel_list_surfaces_remote_failure() {
        let backend = Arc::new(MockBackend::new());
        backend.set_mode(BackendMode::CompleteOutage);

        assert!(provider(backend).hotels().await.is_err());
    }

    #[tokio::test]
    async fn test_create_room_invalidates_cached_rooms() {
        let backend = Arc::new(MockBackend::new());
        let provider = provider(backend.clone());

        let before = provider.rooms("hotel_001").await;
        let new_room = NewRoom {
            name: "Garden Cottage".to_string(),
            description: "Private garden".to_string(),
            room_type: RoomType::Premium,
            capacity: Capacity { adults: 2, children: 0 },
            amenities: vec!["WiFi".to_string()],
            price_per_night: 30000,
            total_rooms: 2,
            size: None,
            bed_type: None,
        };
        provider.create_room("hotel_001", &new_room).await.unwrap();

        let after = provider.rooms("hotel_001").await;
        assert_eq!(after.len(), before.len() + 1);
    }

    #[tokio::test]
    async fn test_hotel_with_rooms() {
        let backend = Arc::new(MockBackend::new());
        let (hotel, rooms) = provider(backend)
            .hotel_with_rooms("hotel_002")
            .await
            .unwrap();
        assert_eq!(hotel.id, "hotel_002");
        assert!(rooms.iter().all(|r| r.hotel_id == "hotel_002"));
    }
}
