// Client-side booking core for the Stayscape hotel backend

// Domain model and pure logic
pub mod models;
pub mod calculator;
pub mod filter;

// Persistence, catalog and backend access
pub mod storage;
pub mod catalog_cache;
pub mod catalog;
pub mod circuit_breaker;
pub mod api;
pub mod session;
pub mod booking_store;

// Re-export key types for convenience
pub use api::{ApiError, AuthApi, BookingApi, ClientConfig, ClientError, HotelApi, HttpApiClient};
pub use booking_store::{BookingError, BookingStore};
pub use calculator::StayQuote;
pub use catalog::{CatalogProvider, LocalCatalog};
pub use filter::{filter_hotels, FilterCriteria, PriceBracket, PRICE_BRACKETS};
pub use models::{Booking, BookingRequest, BookingStatus, Hotel, Room, SearchFilters};
pub use session::{Session, SessionError};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
