//! services/api/src/web/bookings.rs
//!
//! Public availability and booking endpoints, and the admin status change.

use crate::error::{ApiError, ApiResult};
use crate::web::envelope::{AvailabilityView, BookingView, Envelope, SlotView};
use crate::web::extract::{ApiJson, ApiPath, ApiQuery};
use crate::web::form::FormInput;
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveDate;
use consultancy_core::{AdminIdentity, BookingRequest, ServiceError};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

/// GET /availability?date=YYYY-MM-DD
pub async fn availability_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> ApiResult<impl IntoResponse> {
    let raw = query
        .date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ServiceError::Validation("date is required".to_string()))?;
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ServiceError::Validation("date must be formatted as YYYY-MM-DD".to_string())
    })?;

    let slots = state.reservations.availability().availability(date).await?;
    Ok(Json(Envelope::ok(AvailabilityView {
        date,
        slots: slots.into_iter().map(SlotView::from).collect(),
    })))
}

/// POST /bookings - multipart (with an optional `file`) or JSON
pub async fn create_booking_handler(
    State(state): State<Arc<AppState>>,
    form: FormInput,
) -> ApiResult<impl IntoResponse> {
    let file_url = form.save_file(state.files.as_ref(), "file").await?;
    let request = BookingRequest {
        name: form.text("name"),
        email: form.text("email"),
        phone: form.text("phone"),
        service: form.text("service"),
        date: form.text("date"),
        end: form.text("end"),
        notes: form.text("notes"),
        file_url,
    };

    let booking = state.reservations.submit(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(BookingView::from(booking)).with_message("Booking created successfully")),
    ))
}

/// PUT /bookings/{id}/status - admin only
pub async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    ApiPath(booking_id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> ApiResult<impl IntoResponse> {
    let status = update
        .status
        .ok_or_else(|| ApiError::from(ServiceError::Validation("Invalid status provided.".to_string())))?;
    let booking = state
        .moderation
        .set_booking_status(&admin, booking_id, &status)
        .await?;
    Ok(Json(
        Envelope::ok(BookingView::from(booking)).with_message("Booking status updated"),
    ))
}
