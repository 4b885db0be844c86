// API client for the booking backend.
//
// Every endpoint answers with a `{success, data, error?}` envelope. The client
// turns that into a `Result` at this boundary so downstream code never has to
// inspect `success` flags. All `ApiError`s are remote failures: the booking
// store and catalog treat any of them as a signal to use local data instead.

use std::{env, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::models::{Booking, BookingRequest, Hotel, NewRoom, Room, User};
use crate::storage::{KeyValueStore, TOKEN_KEY, USER_KEY};

pub const DEFAULT_BASE_URL: &str = "https://hotel-booking-backend-8a37.onrender.com/api";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    Status { status_code: u16, message: String },

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Circuit breaker open for {service_name}")]
    CircuitBreakerOpen {
        service_name: String,
        retry_after_ms: Option<u64>,
    },
}

impl ApiError {
    // Errors that say something about backend health, as opposed to the request itself
    fn is_backend_failure(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) | ApiError::Malformed(_) => true,
            ApiError::Status { status_code, .. } => *status_code >= 500,
            ApiError::Rejected(_) | ApiError::CircuitBreakerOpen { .. } => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub catalog_ttl_seconds: u64,
    pub circuit_breaker_config: CircuitBreakerConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 30_000,
            catalog_ttl_seconds: 300,
            circuit_breaker_config: CircuitBreakerConfig::default(),
        }
    }
}

impl ClientConfig {
    // Defaults overridden by STAYSCAPE_API_URL, STAYSCAPE_TIMEOUT_MS and STAYSCAPE_CATALOG_TTL_SECONDS
    pub fn from_env() -> Result<Self, ClientError> {
        let mut config = Self::default();

        if let Ok(url) = env::var("STAYSCAPE_API_URL") {
            config.base_url = url;
        }
        if let Some(timeout_ms) = parse_env_u64("STAYSCAPE_TIMEOUT_MS")? {
            config.timeout_ms = timeout_ms;
        }
        if let Some(ttl) = parse_env_u64("STAYSCAPE_CATALOG_TTL_SECONDS")? {
            config.catalog_ttl_seconds = ttl;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::ConfigError(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ClientError::ConfigError(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_seconds)
    }
}

fn parse_env_u64(name: &str) -> Result<Option<u64>, ClientError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ClientError::ConfigError(format!("{name} must be a number, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn failure(error: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.to_string()),
        }
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(ApiError::Rejected("response carried no data".to_string())),
            (false, _) => Err(ApiError::Rejected(
                self.error
                    .or(self.message)
                    .unwrap_or_else(|| "request failed".to_string()),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupData {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[async_trait]
pub trait HotelApi: Send + Sync {
    async fn hotels(&self) -> Result<Vec<Hotel>, ApiError>;

    async fn hotel(&self, id: &str) -> Result<Hotel, ApiError>;

    async fn rooms(&self, hotel_id: &str) -> Result<Vec<Room>, ApiError>;

    async fn create_room(&self, hotel_id: &str, room: &NewRoom) -> Result<Room, ApiError>;
}

#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, ApiError>;

    async fn my_bookings(&self) -> Result<Vec<Booking>, ApiError>;

    async fn cancel_booking(&self, id: &str) -> Result<Booking, ApiError>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError>;

    async fn signup(&self, data: &SignupData) -> Result<SignupResponse, ApiError>;
}

/// reqwest-backed implementation of the backend capabilities.
///
/// The bearer token is read from storage on every request, so a login in one
/// component is picked up by every other holder of the same store. A 401
/// clears the stored session.
pub struct HttpApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    storage: Arc<dyn KeyValueStore>,
    breaker: Mutex<CircuitBreaker>,
}

impl HttpApiClient {
    pub fn new(config: ClientConfig, storage: Arc<dyn KeyValueStore>) -> Result<Self, ClientError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        let breaker = Mutex::new(CircuitBreaker::new(&config.circuit_breaker_config));

        Ok(Self {
            http,
            config,
            storage,
            breaker,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_circuit_open(&self) -> bool {
        self.breaker.lock().is_open()
    }

    pub fn reset_circuit_breaker(&self) {
        self.breaker.lock().reset();
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "could not read session token");
                None
            }
        }
    }

    fn clear_session(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "could not clear session key");
            }
        }
    }

    fn admit(&self) -> Result<(), ApiError> {
        let mut breaker = self.breaker.lock();
        if breaker.should_allow_call() {
            Ok(())
        } else {
            Err(ApiError::CircuitBreakerOpen {
                service_name: self.config.base_url.clone(),
                retry_after_ms: breaker.retry_after_ms(),
            })
        }
    }

    fn record<T>(&self, result: &Result<T, ApiError>) {
        let mut breaker = self.breaker.lock();
        match result {
            Err(e) if e.is_backend_failure() => breaker.fail(),
            _ => breaker.success(),
        }
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.admit()?;
        debug!(method = method.as_str(), path, "calling backend");

        let mut request = self.http.request(method, self.url(path));
        if let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let result = self.execute(request).await;
        self.record(&result);
        result
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.clear_session();
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status_code: status.as_u16(),
                message: error_message(status, &text),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let envelope: ApiResponse<T> =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Malformed(e.to_string()))?;
        envelope.into_result()
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.config.timeout_ms)
        } else if e.is_decode() {
            ApiError::Malformed(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send::<(), T>(Method::GET, path, None).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn put<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send::<(), T>(Method::PUT, path, None).await
    }
}

// Prefer the envelope's own error text over the bare status line
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ApiResponse<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.error.or(envelope.message))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}

#[async_trait]
impl HotelApi for HttpApiClient {
    async fn hotels(&self) -> Result<Vec<Hotel>, ApiError> {
        let page: Paginated<Hotel> = self.get("/hotels").await?;
        Ok(page.data)
    }

    async fn hotel(&self, id: &str) -> Result<Hotel, ApiError> {
        self.get(&format!("/hotels/{id}")).await
    }

    async fn rooms(&self, hotel_id: &str) -> Result<Vec<Room>, ApiError> {
        self.get(&format!("/hotels/{hotel_id}/rooms")).await
    }

    async fn create_room(&self, hotel_id: &str, room: &NewRoom) -> Result<Room, ApiError> {
        self.post(&format!("/hotels/{hotel_id}/rooms"), room).await
    }
}

#[async_trait]
impl BookingApi for HttpApiClient {
    async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, ApiError> {
        self.post("/bookings", request).await
    }

    async fn my_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        self.get("/bookings/my-bookings").await
    }

    async fn cancel_booking(&self, id: &str) -> Result<Booking, ApiError> {
        self.put(&format!("/bookings/{id}/cancel")).await
    }
}

#[async_trait]
impl AuthApi for HttpApiClient {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        self.post("/auth/login", credentials).await
    }

    async fn signup(&self, data: &SignupData) -> Result<SignupResponse, ApiError> {
        self.post("/auth/signup", data).await
    }
}
