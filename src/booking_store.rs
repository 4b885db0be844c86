// Booking store with a local fallback.
//
// Every operation is a two-step pipeline: one remote attempt, then, only if
// that attempt failed, one run of the local path against the bundled catalog
// and the `localBookings` collection in the key-value store. There is no
// retry loop. The local collection is scoped to the store it lives in and is
// last-write-wins across processes sharing the same file.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::BookingApi;
use crate::calculator;
use crate::catalog::LocalCatalog;
use crate::models::{
    Booking, BookingRequest, BookingStatus, PaymentStatus, User, DEFAULT_CURRENCY,
};
use crate::storage::{KeyValueStore, StorageError, LOCAL_BOOKINGS_KEY, USER_KEY};

pub const LOCAL_USER_ID: &str = "local-user";

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl BookingRequest {
    // Required guest fields and a forward date range; checked before any remote call
    pub fn validate(&self) -> Result<(), BookingError> {
        let details = &self.guest_details;
        for (field, value) in [
            ("name", &details.name),
            ("email", &details.email),
            ("phone", &details.phone),
        ] {
            if value.trim().is_empty() {
                return Err(BookingError::Validation(format!(
                    "guest {field} is required"
                )));
            }
        }

        if self.guests.adults < 1 {
            return Err(BookingError::Validation(
                "at least one adult is required".to_string(),
            ));
        }

        calculator::validate_stay(&self.check_in, &self.check_out)
    }
}

pub struct BookingStore {
    remote: Arc<dyn BookingApi>,
    storage: Arc<dyn KeyValueStore>,
    catalog: LocalCatalog,
    // serializes read-modify-write of the local collection within this process
    write_lock: Mutex<()>,
}

impl BookingStore {
    pub fn new(
        remote: Arc<dyn BookingApi>,
        storage: Arc<dyn KeyValueStore>,
        catalog: LocalCatalog,
    ) -> Self {
        Self {
            remote,
            storage,
            catalog,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn create(&self, request: &BookingRequest) -> Result<Booking, BookingError> {
        request.validate()?;

        match self.remote.create_booking(request).await {
            Ok(booking) => {
                info!(booking_id = %booking.id, "booking created remotely");
                Ok(booking)
            }
            Err(e) => {
                warn!(error = %e, hotel_id = %request.hotel_id, "remote booking failed, creating locally");
                self.create_local(request)
            }
        }
    }

    /// Synthesizes and persists a booking from the bundled catalog.
    ///
    /// Local bookings are always `confirmed` and `paid`: there is no payment
    /// step in degraded mode.
    pub fn create_local(&self, request: &BookingRequest) -> Result<Booking, BookingError> {
        let hotel = self
            .catalog
            .hotel(&request.hotel_id)
            .ok_or_else(|| BookingError::NotFound(format!("hotel {}", request.hotel_id)))?;
        let room = self
            .catalog
            .room(&request.hotel_id, &request.room_id)
            .ok_or_else(|| BookingError::NotFound(format!("room {}", request.room_id)))?;

        let quote = calculator::quote(room, &request.check_in, &request.check_out);

        let _guard = self.write_lock.lock();
        let mut bookings = self.load()?;

        let now = Utc::now();
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        let booking = Booking {
            id: unique_local_id(now.timestamp_millis(), &bookings),
            user_id: self.current_user_id(),
            hotel_id: request.hotel_id.clone(),
            room_id: request.room_id.clone(),
            hotel: hotel.clone(),
            room: room.clone(),
            check_in: request.check_in.clone(),
            check_out: request.check_out.clone(),
            guests: request.guests,
            total_price: quote.total_price,
            currency: DEFAULT_CURRENCY.to_string(),
            status: BookingStatus::Confirmed,
            special_requests: request.special_requests.clone(),
            guest_details: request.guest_details.clone(),
            payment_status: PaymentStatus::Paid,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        };

        bookings.push(booking.clone());
        self.save(&bookings)?;

        info!(booking_id = %booking.id, nights = quote.nights, "booking stored locally");
        Ok(booking)
    }

    pub async fn cancel(&self, id: &str) -> Result<Booking, BookingError> {
        match self.remote.cancel_booking(id).await {
            Ok(booking) => {
                info!(booking_id = id, "booking cancelled remotely");
                Ok(booking)
            }
            Err(e) => {
                warn!(error = %e, booking_id = id, "remote cancel failed, cancelling locally");
                self.cancel_local(id)
            }
        }
    }

    // Cancelling an already-cancelled booking is a no-op that returns it unchanged
    pub fn cancel_local(&self, id: &str) -> Result<Booking, BookingError> {
        let _guard = self.write_lock.lock();
        let mut bookings = self.load()?;

        let booking = bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| BookingError::NotFound(format!("booking {id}")))?;

        match booking.status {
            BookingStatus::Cancelled => return Ok(booking.clone()),
            BookingStatus::Completed => {
                return Err(BookingError::Validation(format!(
                    "booking {id} is already completed"
                )))
            }
            BookingStatus::Pending | BookingStatus::Confirmed => {}
        }

        booking.status = BookingStatus::Cancelled;
        booking.updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let cancelled = booking.clone();

        self.save(&bookings)?;
        info!(booking_id = id, "local booking cancelled");
        Ok(cancelled)
    }

    pub async fn list(&self) -> Vec<Booking> {
        match self.remote.my_bookings().await {
            Ok(bookings) => bookings,
            Err(e) => {
                warn!(error = %e, "remote booking list failed, reading local bookings");
                self.list_local()
            }
        }
    }

    // Owned snapshot; mutating it never touches stored state
    pub fn list_local(&self) -> Vec<Booking> {
        self.load().unwrap_or_else(|e| {
            warn!(error = %e, "could not read local bookings");
            Vec::new()
        })
    }

    pub fn get_local(&self, id: &str) -> Option<Booking> {
        self.list_local().into_iter().find(|b| b.id == id)
    }

    // Read failures propagate so a write never replaces bookings it could not see
    fn load(&self) -> Result<Vec<Booking>, BookingError> {
        let Some(raw) = self.storage.get(LOCAL_BOOKINGS_KEY)? else {
            return Ok(Vec::new());
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "local bookings are malformed, treating as empty");
            Vec::new()
        }))
    }

    fn save(&self, bookings: &[Booking]) -> Result<(), BookingError> {
        let raw = serde_json::to_string(bookings).map_err(StorageError::from)?;
        self.storage.set(LOCAL_BOOKINGS_KEY, &raw)?;
        Ok(())
    }

    fn current_user_id(&self) -> String {
        self.storage
            .get(USER_KEY)
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_str::<User>(&raw).ok())
            .map(|user| user.id)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| LOCAL_USER_ID.to_string())
    }
}

fn unique_local_id(millis: i64, existing: &[Booking]) -> String {
    let base = format!("local-{millis}");
    let taken = |id: &str| existing.iter().any(|b| b.id == id);

    if !taken(&base) {
        return base;
    }
    loop {
        let candidate = format!("{base}-{:04x}", rand::random::<u16>());
        if !taken(&candidate) {
            return candidate;
        }
    }
}
