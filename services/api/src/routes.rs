//! API service routes

use auth::User;
use axum::{
    Extension, Form, Json, Router,
    extract::{Path, Query, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{AccessToken, auth_middleware},
    models::{BookingDetails, HotelRoomQuery},
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/user-profile/", get(get_user_profile))
        .route("/users/me", get(get_current_user))
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/token", post(issue_token))
        .route("/bookings/", get(get_bookings))
        .route("/booking/", post(create_booking))
        .route(
            "/booking/:booking_id",
            get(get_booking).put(update_booking).delete(delete_booking),
        )
        .route("/hotel-rooms/", get(get_hotel_rooms))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Greeting endpoint
pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Hello Worlds" }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "store": state.store.health_check().await,
    }))
}

/// Sign-in form; `username` carries the email
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

/// Exchange credentials for a bearer token
pub async fn issue_token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> ApiResult<impl IntoResponse> {
    let throttle_key = form.username.trim().to_lowercase();

    if !state.rate_limiter.try_attempt(&throttle_key).await {
        warn!("Sign-in throttled for {}", throttle_key);
        return Err(ApiError::TooManyRequests(
            "Too many failed sign-in attempts, try again later".to_string(),
        ));
    }

    let issued = state
        .authenticator
        .authenticate(&form.username, &form.password)
        .await?;
    state.rate_limiter.reset(&throttle_key).await;

    Ok(Json(issued))
}

/// Profile of the authenticated user
pub async fn get_user_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .profile_repository
        .find_by_user_id(user.id)
        .await
        .map_err(|e| {
            error!("Failed to get profile for user {}: {}", user.id, e);
            ApiError::Internal("User profile not found".to_string())
        })?;

    Ok(Json(profile))
}

/// The authenticated user
pub async fn get_current_user(Extension(user): Extension<User>) -> impl IntoResponse {
    Json(user)
}

/// Revoke the token the request was made with
pub async fn logout(
    State(state): State<AppState>,
    Extension(token): Extension<AccessToken>,
) -> ApiResult<impl IntoResponse> {
    state.authenticator.revoke(&token.0).await?;
    Ok(Json(json!({ "message": "Logged out" })))
}

/// Get all bookings
pub async fn get_bookings(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let bookings = state.booking_repository.list().await.map_err(|e| {
        error!("Failed to get bookings: {}", e);
        e
    })?;

    Ok(Json(bookings))
}

/// Get a booking by ID, as a list of zero or one bookings
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let bookings = state
        .booking_repository
        .find_by_id(&booking_id)
        .await
        .map_err(|e| {
            error!("Failed to get booking {}: {}", booking_id, e);
            e
        })?;

    Ok(Json(bookings))
}

/// Create a booking
pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<BookingDetails>,
) -> ApiResult<impl IntoResponse> {
    let booking = state.booking_repository.create(payload).await.map_err(|e| {
        error!("Failed to create booking: {}", e);
        e
    })?;

    Ok(Json(booking))
}

/// Replace every field of a booking
pub async fn update_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    Json(payload): Json<BookingDetails>,
) -> ApiResult<impl IntoResponse> {
    let booking = state
        .booking_repository
        .update(&booking_id, payload)
        .await
        .map_err(|e| {
            error!("Failed to update booking {}: {}", booking_id, e);
            e
        })?;

    Ok(Json(booking))
}

/// Delete a booking
pub async fn delete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state
        .booking_repository
        .delete(&booking_id)
        .await
        .map_err(|e| {
            error!("Failed to delete booking {}: {}", booking_id, e);
            e
        })?;

    Ok(Json(json!({
        "message": "Booking deleted successfully",
        "booking_id": booking_id,
    })))
}

/// Hotel rooms, optionally filtered by type, ordered by price
pub async fn get_hotel_rooms(
    State(state): State<AppState>,
    Query(query): Query<HotelRoomQuery>,
) -> ApiResult<impl IntoResponse> {
    let rooms = state
        .hotel_room_repository
        .search(query.room_type(), query.is_ascending())
        .await
        .map_err(|e| {
            error!("Failed to get hotel rooms: {}", e);
            e
        })?;

    Ok(Json(rooms))
}
