//! crates/consultancy_core/src/moderation.rs
//!
//! Administrator-only state changes: booking status, testimonial approval,
//! hard deletes and ad-hoc payment links. Each operation takes the
//! `AdminIdentity` the request was authenticated as.

use crate::domain::{
    AdminIdentity, BlogPost, Booking, BookingStatus, ContactMessage, PaymentRequest,
    PaymentSession, Testimonial,
};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{Clock, DatabaseService, FileStore, PaymentGateway, PortError};
use crate::uploads::discard_upload;
use crate::validation::{optional, required};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Used when an ad-hoc payment link is created without a client email.
const FALLBACK_PAYER_EMAIL: &str = "customer@example.com";

/// An ad-hoc payment link request. `amount_naira` is converted to kobo.
#[derive(Debug, Clone, Default)]
pub struct PaymentLinkRequest {
    pub client_name: Option<String>,
    pub amount_naira: Option<f64>,
    pub purpose: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct ModerationService {
    db: Arc<dyn DatabaseService>,
    files: Arc<dyn FileStore>,
    payments: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
}

impl ModerationService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        files: Arc<dyn FileStore>,
        payments: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            files,
            payments,
            clock,
        }
    }

    pub async fn list_bookings(&self, _admin: &AdminIdentity) -> ServiceResult<Vec<Booking>> {
        Ok(self.db.list_bookings().await?)
    }

    /// Sets a booking's status. Payment state is left as it is.
    pub async fn set_booking_status(
        &self,
        admin: &AdminIdentity,
        booking_id: Uuid,
        status: &str,
    ) -> ServiceResult<Booking> {
        let status: BookingStatus = status
            .trim()
            .parse()
            .map_err(|_| ServiceError::Validation("Invalid status provided.".to_string()))?;

        let booking = self
            .db
            .set_booking_status(booking_id, status)
            .await
            .map_err(|e| match e {
                PortError::Conflict(_) => ServiceError::InvalidState(
                    "Another booking already holds this time slot".to_string(),
                ),
                other => other.into(),
            })?;
        info!("{} set booking {} to {}", admin.email, booking_id, status);
        Ok(booking)
    }

    pub async fn list_testimonials(&self, _admin: &AdminIdentity) -> ServiceResult<Vec<Testimonial>> {
        Ok(self.db.list_testimonials(false).await?)
    }

    /// Marks a testimonial as approved. Approving twice is harmless.
    pub async fn approve_testimonial(
        &self,
        admin: &AdminIdentity,
        testimonial_id: Uuid,
    ) -> ServiceResult<Testimonial> {
        let testimonial = self.db.approve_testimonial(testimonial_id).await?;
        info!("{} approved testimonial {}", admin.email, testimonial_id);
        Ok(testimonial)
    }

    pub async fn delete_testimonial(
        &self,
        admin: &AdminIdentity,
        testimonial_id: Uuid,
    ) -> ServiceResult<Testimonial> {
        let deleted = self.db.delete_testimonial(testimonial_id).await?;
        discard_upload(self.files.as_ref(), deleted.photo.as_deref()).await;
        info!("{} deleted testimonial {}", admin.email, testimonial_id);
        Ok(deleted)
    }

    pub async fn delete_blog_post(
        &self,
        admin: &AdminIdentity,
        post_id: Uuid,
    ) -> ServiceResult<BlogPost> {
        let deleted = self.db.delete_blog_post(post_id).await?;
        discard_upload(self.files.as_ref(), deleted.image.as_deref()).await;
        info!("{} deleted blog post {}", admin.email, post_id);
        Ok(deleted)
    }

    pub async fn delete_contact_message(
        &self,
        admin: &AdminIdentity,
        message_id: Uuid,
    ) -> ServiceResult<ContactMessage> {
        let deleted = self.db.delete_contact_message(message_id).await?;
        info!("{} deleted contact message {}", admin.email, message_id);
        Ok(deleted)
    }

    /// Creates a hosted payment link that is not tied to a booking.
    pub async fn create_payment_link(
        &self,
        admin: &AdminIdentity,
        request: PaymentLinkRequest,
    ) -> ServiceResult<PaymentSession> {
        let client_name = required("client_name", request.client_name.as_deref())?;
        let purpose = required("purpose", request.purpose.as_deref())?;
        let amount_kobo = match request.amount_naira {
            Some(amount) if amount.is_finite() && amount > 0.0 => (amount * 100.0).round() as u64,
            _ => {
                return Err(ServiceError::Validation(
                    "amount must be a positive number".to_string(),
                ))
            }
        };

        let payment = PaymentRequest {
            email: optional(request.email.as_deref())
                .unwrap_or_else(|| FALLBACK_PAYER_EMAIL.to_string()),
            amount_kobo,
            reference: format!("PL-{}", Uuid::new_v4().simple()),
            callback_url: None,
            metadata: vec![
                ("client_name".to_string(), client_name.clone()),
                ("purpose".to_string(), purpose),
            ],
        };
        let checkout = self.payments.initialize(&payment).await.map_err(|e| {
            warn!("Payment link for {} failed: {}", client_name, e);
            ServiceError::PaymentInit(e.to_string())
        })?;

        let session = PaymentSession {
            booking_id: None,
            reference: checkout.reference,
            payment_url: checkout.authorization_url,
            amount_kobo,
            created_at: self.clock.now(),
        };
        self.db.save_payment_session(&session).await?;
        info!(
            "{} created payment link {} for {}",
            admin.email, session.reference, client_name
        );
        Ok(session)
    }
}

//=========================================================================================
// Tests
//=========================================================================================
