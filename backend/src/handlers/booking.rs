//! Booking handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{Booking, BookingDetails};
use crate::services::{booking::CreateBookingInput, BookingService};
use crate::AppState;

#[derive(Serialize)]
pub struct BookingCreatedResponse {
    pub message: String,
    pub booking: BookingDetails,
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: String,
}

fn booking_service(state: &AppState) -> BookingService {
    BookingService::new(state.store.clone(), state.notifications())
}

/// Book an artisan for the calling client
pub async fn book_artisan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateBookingInput>,
) -> AppResult<(StatusCode, Json<BookingCreatedResponse>)> {
    let booking = booking_service(&state).create(&user, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse {
            message: "Booking created successfully".to_string(),
            booking,
        }),
    ))
}

/// Bookings of the calling user, newest first
pub async fn list_bookings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<BookingDetails>>> {
    Ok(Json(booking_service(&state).list(&user).await?))
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<StatusUpdateRequest>,
) -> AppResult<Json<Booking>> {
    let booking = booking_service(&state)
        .update_status(&user, booking_id, &body.status)
        .await?;
    Ok(Json(booking))
}
