// Hotel filter engine
//
// Criteria compose with AND. Within the price predicate the selected brackets
// compose with OR. Amenities are conjunctive: a hotel must offer every
// selected amenity.

use crate::models::Hotel;

pub const ALL_CITIES: &str = "All Cities";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBracket {
    pub id: &'static str,
    pub label: &'static str,
    pub min: u64,
    // `None` is open-ended
    pub max: Option<u64>,
}

impl PriceBracket {
    // Half-open: [min, max)
    pub fn contains(&self, amount: u64) -> bool {
        amount >= self.min && self.max.map_or(true, |max| amount < max)
    }

    pub fn by_id(id: &str) -> Option<&'static PriceBracket> {
        PRICE_BRACKETS.iter().find(|bracket| bracket.id == id)
    }
}

pub static PRICE_BRACKETS: [PriceBracket; 5] = [
    PriceBracket {
        id: "price-1",
        label: "Under ₹5,000",
        min: 0,
        max: Some(5_000),
    },
    PriceBracket {
        id: "price-2",
        label: "₹5,000 - ₹10,000",
        min: 5_000,
        max: Some(10_000),
    },
    PriceBracket {
        id: "price-3",
        label: "₹10,000 - ₹20,000",
        min: 10_000,
        max: Some(20_000),
    },
    PriceBracket {
        id: "price-4",
        label: "₹20,000 - ₹35,000",
        min: 20_000,
        max: Some(35_000),
    },
    PriceBracket {
        id: "price-5",
        label: "₹35,000+",
        min: 35_000,
        max: None,
    },
];

pub const STAR_RATINGS: [u8; 3] = [5, 4, 3];

pub const AMENITIES: [&str; 9] = [
    "WiFi",
    "Pool",
    "Spa",
    "Gym",
    "Restaurant",
    "Bar",
    "Beach",
    "Parking",
    "Business Center",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub location: Option<String>,
    pub city: Option<String>,
    // Bracket ids; unknown ids match nothing
    pub price_brackets: Vec<String>,
    pub star_ratings: Vec<u8>,
    pub amenities: Vec<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.set_location(location);
        self
    }

    pub fn with_city(mut self, city: &str) -> Self {
        self.select_city(city);
        self
    }

    pub fn with_price_bracket(mut self, id: &str) -> Self {
        if !self.price_brackets.iter().any(|b| b == id) {
            self.price_brackets.push(id.to_string());
        }
        self
    }

    pub fn with_star_rating(mut self, rating: u8) -> Self {
        if !self.star_ratings.contains(&rating) {
            self.star_ratings.push(rating);
        }
        self
    }

    pub fn with_amenity(mut self, amenity: &str) -> Self {
        if !self.amenities.iter().any(|a| a == amenity) {
            self.amenities.push(amenity.to_string());
        }
        self
    }

    pub fn set_location(&mut self, location: &str) {
        self.location = if location.trim().is_empty() {
            None
        } else {
            Some(location.to_string())
        };
    }

    // `ALL_CITIES` or an empty name clears the city selection
    pub fn select_city(&mut self, city: &str) {
        self.city = if city.is_empty() || city == ALL_CITIES {
            None
        } else {
            Some(city.to_string())
        };
    }

    pub fn toggle_price_bracket(&mut self, id: &str) {
        toggle(&mut self.price_brackets, id.to_string());
    }

    pub fn toggle_star_rating(&mut self, rating: u8) {
        toggle(&mut self.star_ratings, rating);
    }

    pub fn toggle_amenity(&mut self, amenity: &str) {
        toggle(&mut self.amenities, amenity.to_string());
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // Free-text location is not counted, matching the filter badge
    pub fn active_count(&self) -> usize {
        self.price_brackets.len()
            + self.star_ratings.len()
            + self.amenities.len()
            + usize::from(self.city.is_some())
    }

    pub fn matches(&self, hotel: &Hotel) -> bool {
        self.matches_location(hotel)
            && self.matches_city(hotel)
            && self.matches_price(hotel)
            && self.matches_stars(hotel)
            && self.matches_amenities(hotel)
    }

    fn matches_location(&self, hotel: &Hotel) -> bool {
        let Some(location) = &self.location else {
            return true;
        };
        let needle = location.to_lowercase();

        [
            hotel.location.city.as_str(),
            hotel.name.as_str(),
            hotel.location.country.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_city(&self, hotel: &Hotel) -> bool {
        self.city
            .as_deref()
            .map_or(true, |city| hotel.location.city == city)
    }

    fn matches_price(&self, hotel: &Hotel) -> bool {
        if self.price_brackets.is_empty() {
            return true;
        }
        self.price_brackets.iter().any(|id| {
            PriceBracket::by_id(id).map_or(false, |bracket| bracket.contains(hotel.price_range.min))
        })
    }

    fn matches_stars(&self, hotel: &Hotel) -> bool {
        self.star_ratings.is_empty() || self.star_ratings.contains(&hotel.star_rating)
    }

    fn matches_amenities(&self, hotel: &Hotel) -> bool {
        self.amenities.iter().all(|amenity| hotel.has_amenity(amenity))
    }
}

fn toggle<T: PartialEq>(selection: &mut Vec<T>, value: T) {
    if let Some(pos) = selection.iter().position(|v| *v == value) {
        selection.remove(pos);
    } else {
        selection.push(value);
    }
}

/// Returns the hotels matching every criterion, in input order.
pub fn filter_hotels<'a>(hotels: &'a [Hotel], criteria: &FilterCriteria) -> Vec<&'a Hotel> {
    hotels.iter().filter(|hotel| criteria.matches(hotel)).collect()
}
