// Booking calculator: night count, totals and guest adjustment.
//
// Everything here is total over its inputs. Bad or inverted dates price as a
// single night; rejecting them is left to `validate_stay`, which callers run
// before submitting a booking.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::booking_store::BookingError;
use crate::models::{Capacity, Guests, Room};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StayQuote {
    pub nights: u32,
    pub price_per_night: u64,
    pub total_price: u64,
    pub currency: String,
}

// Accepts `YYYY-MM-DD`, RFC 3339, or a bare `YYYY-MM-DDTHH:MM:SS` (read as UTC)
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Some(date_time.naive_utc());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").ok()
}

/// Number of billable nights between `check_in` and `check_out`.
///
/// Partial days round up. The result is never below 1, so equal, inverted or
/// unparseable dates still price as one night.
pub fn nights(check_in: &str, check_out: &str) -> u32 {
    let (Some(start), Some(end)) = (parse_date(check_in), parse_date(check_out)) else {
        return 1;
    };

    let diff_ms = (end - start).num_milliseconds();
    if diff_ms <= 0 {
        return 1;
    }

    let days = (diff_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
    u32::try_from(days).unwrap_or(u32::MAX).max(1)
}

pub fn total_price(price_per_night: u64, nights: u32) -> u64 {
    price_per_night.saturating_mul(u64::from(nights))
}

pub fn quote(room: &Room, check_in: &str, check_out: &str) -> StayQuote {
    let nights = nights(check_in, check_out);
    StayQuote {
        nights,
        price_per_night: room.price_per_night,
        total_price: total_price(room.price_per_night, nights),
        currency: room.currency.clone(),
    }
}

// Submission-time check; the calculator itself never rejects a date pair.
pub fn validate_stay(check_in: &str, check_out: &str) -> Result<(), BookingError> {
    let start = parse_date(check_in)
        .ok_or_else(|| BookingError::Validation(format!("invalid check-in date: {check_in:?}")))?;
    let end = parse_date(check_out)
        .ok_or_else(|| BookingError::Validation(format!("invalid check-out date: {check_out:?}")))?;

    if end <= start {
        return Err(BookingError::Validation(
            "check-out must be after check-in".to_string(),
        ));
    }

    Ok(())
}

impl Guests {
    pub fn new(adults: u32, children: u32) -> Self {
        Self {
            adults: adults.max(1),
            children,
        }
    }

    pub fn increment_adults(&mut self) {
        self.adults = self.adults.saturating_add(1);
    }

    // Floor of one adult per booking
    pub fn decrement_adults(&mut self) {
        self.adults = self.adults.saturating_sub(1).max(1);
    }

    pub fn increment_children(&mut self) {
        self.children = self.children.saturating_add(1);
    }

    pub fn decrement_children(&mut self) {
        self.children = self.children.saturating_sub(1);
    }

    pub fn total(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }

    pub fn fits(&self, capacity: &Capacity) -> bool {
        self.adults <= capacity.adults && self.children <= capacity.children
    }
}
