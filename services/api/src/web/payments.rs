//! services/api/src/web/payments.rs
//!
//! Hosted-checkout initialization and verification for bookings.

use crate::error::ApiResult;
use crate::web::envelope::{Envelope, PaymentSessionView, VerificationView};
use crate::web::extract::{ApiPath, ApiQuery};
use crate::web::state::AppState;
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub reference: String,
}

/// POST /payment/initialize/{bookingId}
pub async fn initialize_payment_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(booking_id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let session = state.reservations.initialize_payment(booking_id).await?;
    Ok(Json(Envelope::ok(PaymentSessionView::from(session))))
}

/// GET /payment/verify/{bookingId}?reference=...
///
/// A declined payment is still a 200; `success` and `data.verified` say
/// whether the booking is paid.
pub async fn verify_payment_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(booking_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<VerifyQuery>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state
        .reservations
        .verify_payment(booking_id, &query.reference)
        .await?;
    let paid = outcome.is_paid();
    let view = VerificationView::from(outcome);
    let message = match &view.reason {
        Some(reason) => reason.clone(),
        None => "Payment verified and booking confirmed".to_string(),
    };
    let mut envelope = Envelope::ok(view).with_message(message);
    envelope.success = paid;
    Ok(Json(envelope))
}
