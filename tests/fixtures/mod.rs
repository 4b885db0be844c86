//! Mock booking backend served over real HTTP for integration tests.
//!
//! Routes mirror the production API under `/api` and answer with the
//! `{success, data, error}` envelope. `ServerMode` switches the whole server
//! into a failure mode so the client's fallbacks can be exercised end to end.

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicU8, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use stayscape::{
    calculator,
    models::{Booking, BookingRequest, BookingStatus, PaymentStatus, User},
    LocalCatalog,
};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerMode {
    Normal = 0,
    ServerError = 1,
    Unauthorized = 2,
    Rejecting = 3,
    Malformed = 4,
    Slow = 5,
}

impl ServerMode {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ServerMode::ServerError,
            2 => ServerMode::Unauthorized,
            3 => ServerMode::Rejecting,
            4 => ServerMode::Malformed,
            5 => ServerMode::Slow,
            _ => ServerMode::Normal,
        }
    }
}

pub struct ServerState {
    mode: AtomicU8,
    hits: AtomicUsize,
    authorization: Mutex<Vec<Option<String>>>,
    bookings: Mutex<Vec<Booking>>,
    catalog: LocalCatalog,
}

pub struct TestServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let state = Arc::new(ServerState {
            mode: AtomicU8::new(ServerMode::Normal as u8),
            hits: AtomicUsize::new(0),
            authorization: Mutex::new(Vec::new()),
            bookings: Mutex::new(Vec::new()),
            catalog: LocalCatalog::new(),
        });

        let app = Router::new()
            .route("/api/hotels", get(list_hotels))
            .route("/api/hotels/:id", get(hotel_detail))
            .route("/api/hotels/:id/rooms", get(hotel_rooms))
            .route("/api/bookings", post(create_booking))
            .route("/api/bookings/my-bookings", get(my_bookings))
            .route("/api/bookings/:id/cancel", put(cancel_booking))
            .route("/api/auth/login", post(login))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server crashed");
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn set_mode(&self, mode: ServerMode) {
        self.state.mode.store(mode as u8, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    // Authorization header of every request, in arrival order
    pub fn authorization_headers(&self) -> Vec<Option<String>> {
        self.state.authorization.lock().clone()
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.state.bookings.lock().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn envelope(data: impl serde::Serialize) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn failure(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "success": false, "error": error }))).into_response()
}

// Records the request and answers for any failure mode; `None` means serve normally
async fn intercept(state: &ServerState, headers: &HeaderMap) -> Option<Response> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.authorization.lock().push(
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    );

    match ServerMode::from_u8(state.mode.load(Ordering::SeqCst)) {
        ServerMode::Normal => None,
        ServerMode::ServerError => Some(failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Database unavailable",
        )),
        ServerMode::Unauthorized => Some(failure(StatusCode::UNAUTHORIZED, "Token expired")),
        ServerMode::Rejecting => Some(failure(StatusCode::OK, "Room sold out")),
        ServerMode::Malformed => Some((StatusCode::OK, "<html>maintenance</html>").into_response()),
        ServerMode::Slow => {
            tokio::time::sleep(Duration::from_millis(500)).await;
            None
        }
    }
}

async fn list_hotels(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    if let Some(response) = intercept(&state, &headers).await {
        return response;
    }
    let hotels = state.catalog.hotels();
    envelope(json!({
        "data": hotels,
        "pagination": { "page": 1, "limit": 20, "total": hotels.len(), "totalPages": 1 }
    }))
}

async fn hotel_detail(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = intercept(&state, &headers).await {
        return response;
    }
    match state.catalog.hotel(&id) {
        Some(hotel) => envelope(hotel),
        None => failure(StatusCode::NOT_FOUND, "Hotel not found"),
    }
}

async fn hotel_rooms(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = intercept(&state, &headers).await {
        return response;
    }
    envelope(state.catalog.rooms(&id))
}

async fn create_booking(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(request): Json<BookingRequest>,
) -> Response {
    if let Some(response) = intercept(&state, &headers).await {
        return response;
    }
    let (Some(hotel), Some(room)) = (
        state.catalog.hotel(&request.hotel_id),
        state.catalog.room(&request.hotel_id, &request.room_id),
    ) else {
        return failure(StatusCode::NOT_FOUND, "Room not found");
    };

    let nights = calculator::nights(&request.check_in, &request.check_out);
    let mut bookings = state.bookings.lock();
    let booking = Booking {
        id: format!("bk_{}", bookings.len() + 1),
        user_id: "user-1".to_string(),
        hotel_id: request.hotel_id.clone(),
        room_id: request.room_id.clone(),
        hotel: hotel.clone(),
        room: room.clone(),
        check_in: request.check_in,
        check_out: request.check_out,
        guests: request.guests,
        total_price: calculator::total_price(room.price_per_night, nights),
        currency: "INR".to_string(),
        status: BookingStatus::Pending,
        special_requests: request.special_requests,
        guest_details: request.guest_details,
        payment_status: PaymentStatus::Pending,
        created_at: "2024-05-01T00:00:00.000Z".to_string(),
        updated_at: "2024-05-01T00:00:00.000Z".to_string(),
    };
    bookings.push(booking.clone());
    (StatusCode::CREATED, Json(json!({ "success": true, "data": booking }))).into_response()
}

async fn my_bookings(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    if let Some(response) = intercept(&state, &headers).await {
        return response;
    }
    envelope(state.bookings.lock().clone())
}

async fn cancel_booking(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = intercept(&state, &headers).await {
        return response;
    }
    let mut bookings = state.bookings.lock();
    match bookings.iter_mut().find(|b| b.id == id) {
        Some(booking) => {
            booking.status = BookingStatus::Cancelled;
            envelope(booking.clone())
        }
        None => failure(StatusCode::NOT_FOUND, "Booking not found"),
    }
}

async fn login(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(response) = intercept(&state, &headers).await {
        return response;
    }
    let email = body["email"].as_str().unwrap_or_default();
    if body["password"] != "secret" {
        return failure(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    let user = User {
        id: "user-1".to_string(),
        email: email.to_string(),
        name: "Asha Rao".to_string(),
        role: "user".to_string(),
        ..Default::default()
    };
    envelope(json!({ "token": format!("token-{email}"), "user": user }))
}
