//! crates/consultancy_core/src/reservation.rs
//!
//! The booking reservation flow: validate a submission, re-check the slot,
//! insert the pending booking, then initialize and verify its payment.
//!
//! There is no lock between the availability re-check and the insert. The
//! re-check is only a fast pre-flight; the storage layer's uniqueness rule on
//! non-cancelled slot starts is what decides a race, and a `PortError::Conflict`
//! from the insert is reported exactly like a failed pre-flight.

use crate::availability::AvailabilityCalculator;
use crate::domain::{
    Booking, BookingStatus, GatewayTransactionStatus, NewBooking, PaymentOutcome,
    PaymentRequest, PaymentSession, PaymentStatus,
};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{Clock, DatabaseService, FileStore, PaymentGateway, PortError};
use crate::uploads::discard_upload;
use crate::validation::{optional, parse_timestamp, required, validate_email, validate_service};
use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Default consultation fee: ₦50,000 in kobo.
pub const DEFAULT_CONSULTATION_FEE_KOBO: u64 = 5_000_000;

/// Default age after which an unpaid pending booking releases its slot.
pub const DEFAULT_PENDING_EXPIRY_MINUTES: i64 = 24 * 60;

//=========================================================================================
// Inputs and Settings
//=========================================================================================

/// A booking submission as received from the client. Every field is raw so
/// that missing and malformed values are reported the same way.
#[derive(Debug, Clone, Default)]
pub struct BookingRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    /// Requested slot start.
    pub date: Option<String>,
    /// Optional slot end; must match the template when given.
    pub end: Option<String>,
    pub notes: Option<String>,
    /// Public path of a file already saved to the `FileStore`.
    pub file_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReservationSettings {
    pub consultation_fee_kobo: u64,
    /// Where the gateway sends the client after checkout.
    pub callback_url: Option<String>,
    /// `None` keeps unpaid bookings pending forever.
    pub pending_expiry: Option<Duration>,
}

impl Default for ReservationSettings {
    fn default() -> Self {
        Self {
            consultation_fee_kobo: DEFAULT_CONSULTATION_FEE_KOBO,
            callback_url: None,
            pending_expiry: Some(Duration::minutes(DEFAULT_PENDING_EXPIRY_MINUTES)),
        }
    }
}

//=========================================================================================
// Reservation Service
//=========================================================================================

#[derive(Clone)]
pub struct ReservationService {
    db: Arc<dyn DatabaseService>,
    payments: Arc<dyn PaymentGateway>,
    files: Arc<dyn FileStore>,
    clock: Arc<dyn Clock>,
    availability: AvailabilityCalculator,
    settings: ReservationSettings,
}

impl ReservationService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        payments: Arc<dyn PaymentGateway>,
        files: Arc<dyn FileStore>,
        clock: Arc<dyn Clock>,
        availability: AvailabilityCalculator,
        settings: ReservationSettings,
    ) -> Self {
        Self {
            db,
            payments,
            files,
            clock,
            availability,
            settings,
        }
    }

    pub fn availability(&self) -> &AvailabilityCalculator {
        &self.availability
    }

    /// Validates the request and creates a pending, unpaid booking.
    ///
    /// On any failure the uploaded file referenced by the request is removed.
    pub async fn submit(&self, request: BookingRequest) -> ServiceResult<Booking> {
        let file_url = request.file_url.clone();
        let result = self.reserve(request).await;
        if result.is_err() {
            discard_upload(self.files.as_ref(), file_url.as_deref()).await;
        }
        result
    }

    async fn reserve(&self, request: BookingRequest) -> ServiceResult<Booking> {
        let new_booking = self.validate(request)?;
        let date = new_booking.slot_start.date_naive();

        let slots = self.availability.slots_on(date).await?;
        let taken = slots
            .iter()
            .any(|slot| slot.start == new_booking.slot_start && !slot.available);
        if taken {
            info!("Slot {} already taken, offering alternatives", new_booking.slot_start);
            return Err(self.conflict(date).await);
        }

        match self.db.insert_booking(new_booking).await {
            Ok(booking) => {
                info!(
                    "Booking {} reserved for {} ({})",
                    booking.id, booking.slot_start, booking.service
                );
                Ok(booking)
            }
            Err(PortError::Conflict(detail)) => {
                warn!("Lost race for slot on {}: {}", date, detail);
                Err(self.conflict(date).await)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn validate(&self, request: BookingRequest) -> ServiceResult<NewBooking> {
        let name = required("name", request.name.as_deref())?;
        let email = required("email", request.email.as_deref())?;
        let phone = required("phone", request.phone.as_deref())?;
        let service = required("service", request.service.as_deref())?;
        let date = required("date", request.date.as_deref())?;
        validate_email(&email)?;
        validate_service(&service)?;

        let requested_start = parse_timestamp("date", &date)?;
        let (slot_start, slot_end) = self.availability.bookable_window(requested_start)?;
        if let Some(end) = optional(request.end.as_deref()) {
            if parse_timestamp("end", &end)? != slot_end {
                return Err(ServiceError::Validation(
                    "end does not match the selected time slot".to_string(),
                ));
            }
        }

        Ok(NewBooking {
            name,
            email,
            phone,
            service,
            slot_start,
            slot_end,
            notes: optional(request.notes.as_deref()),
            file_url: optional(request.file_url.as_deref()),
        })
    }

    /// Builds the conflict error with the slots of `date` that can still be booked.
    async fn conflict(&self, date: NaiveDate) -> ServiceError {
        let now = self.clock.now();
        match self.availability.free_slots_on(date).await {
            Ok(free) => ServiceError::SlotConflict {
                suggestions: free.into_iter().filter(|slot| slot.start >= now).collect(),
            },
            Err(e) => e,
        }
    }

    /// Creates a hosted payment session for a pending, unpaid booking.
    ///
    /// A gateway failure leaves the booking untouched, so this can be retried.
    pub async fn initialize_payment(&self, booking_id: Uuid) -> ServiceResult<PaymentSession> {
        let booking = self.db.get_booking(booking_id).await?;
        if booking.status != BookingStatus::Pending || booking.payment_status != PaymentStatus::Unpaid {
            return Err(ServiceError::InvalidState(format!(
                "Booking {} is {} and {}, not awaiting payment",
                booking.id, booking.status, booking.payment_status
            )));
        }

        let request = PaymentRequest {
            email: booking.email.clone(),
            amount_kobo: self.settings.consultation_fee_kobo,
            reference: format!("BK-{}", Uuid::new_v4().simple()),
            callback_url: self
                .settings
                .callback_url
                .as_ref()
                .map(|url| with_booking_id(url, booking.id)),
            metadata: vec![
                ("booking_id".to_string(), booking.id.to_string()),
                ("client_name".to_string(), booking.name.clone()),
                ("purpose".to_string(), format!("{} consultation", booking.service)),
            ],
        };

        let checkout = self.payments.initialize(&request).await.map_err(|e| {
            warn!("Payment initialization for booking {} failed: {}", booking.id, e);
            ServiceError::PaymentInit(e.to_string())
        })?;

        let session = PaymentSession {
            booking_id: Some(booking.id),
            reference: checkout.reference,
            payment_url: checkout.authorization_url,
            amount_kobo: request.amount_kobo,
            created_at: self.clock.now(),
        };
        self.db.save_payment_session(&session).await?;
        info!(
            "Payment session {} opened for booking {}",
            session.reference, booking.id
        );
        Ok(session)
    }

    /// Confirms the booking when the gateway reports the payment as successful.
    ///
    /// Verifying a booking that is already paid is a no-op success. A declined
    /// payment or an unknown reference leaves the booking pending and unpaid.
    pub async fn verify_payment(
        &self,
        booking_id: Uuid,
        reference: &str,
    ) -> ServiceResult<PaymentOutcome> {
        let reference = required("reference", Some(reference))?;
        let booking = self.db.get_booking(booking_id).await?;

        if booking.payment_status == PaymentStatus::Paid {
            return Ok(PaymentOutcome::AlreadyConfirmed(booking));
        }
        if booking.status == BookingStatus::Cancelled {
            return Err(self.cancelled_booking_error(&booking, &reference).await);
        }

        let Some(session) = self.db.find_payment_session(booking_id, &reference).await? else {
            warn!("Reference {} does not belong to booking {}", reference, booking_id);
            return Ok(PaymentOutcome::Failed {
                booking,
                reason: "Payment reference does not match this booking".to_string(),
            });
        };

        let transaction = self.payments.verify(&reference).await.map_err(|e| {
            warn!("Payment verification for booking {} failed: {}", booking_id, e);
            ServiceError::PaymentVerification(e.to_string())
        })?;

        if transaction.reference != reference {
            return Ok(PaymentOutcome::Failed {
                booking,
                reason: "Gateway returned a different transaction".to_string(),
            });
        }
        if transaction.status != GatewayTransactionStatus::Success {
            let reason = transaction
                .gateway_response
                .unwrap_or_else(|| format!("Payment status is {:?}", transaction.status));
            info!("Payment {} for booking {} not successful: {}", reference, booking_id, reason);
            return Ok(PaymentOutcome::Failed { booking, reason });
        }
        if transaction.amount_kobo < session.amount_kobo {
            warn!(
                "Payment {} underpaid: {} of {} kobo",
                reference, transaction.amount_kobo, session.amount_kobo
            );
            return Ok(PaymentOutcome::Failed {
                booking,
                reason: "Amount paid is less than the consultation fee".to_string(),
            });
        }

        match self.db.mark_booking_paid(booking_id, &reference).await? {
            Some(confirmed) => {
                info!("Booking {} confirmed by payment {}", booking_id, reference);
                Ok(PaymentOutcome::Confirmed(confirmed))
            }
            None => Ok(PaymentOutcome::AlreadyConfirmed(
                self.db.get_booking(booking_id).await?,
            )),
        }
    }

    /// Builds the error for verifying a cancelled booking. If the gateway says
    /// the reference was paid in full anyway, the money has arrived for a slot
    /// that was released, so it is logged at error level and named in the
    /// message for manual follow-up.
    async fn cancelled_booking_error(&self, booking: &Booking, reference: &str) -> ServiceError {
        let cancelled = ServiceError::InvalidState(format!("Booking {} has been cancelled", booking.id));
        let Ok(Some(session)) = self.db.find_payment_session(booking.id, reference).await else {
            return cancelled;
        };
        match self.payments.verify(reference).await {
            Ok(tx)
                if tx.reference == reference
                    && tx.status == GatewayTransactionStatus::Success
                    && tx.amount_kobo >= session.amount_kobo =>
            {
                error!(
                    "Payment {} of {} kobo succeeded for cancelled booking {}; needs refund or rebooking",
                    reference, tx.amount_kobo, booking.id
                );
                ServiceError::InvalidState(format!(
                    "Booking {} was cancelled before payment {} was received; the payment has been flagged for refund or rebooking",
                    booking.id, reference
                ))
            }
            _ => cancelled,
        }
    }

    /// Cancels unpaid pending bookings older than the configured expiry,
    /// releasing their slots. Returns the cancelled ids.
    pub async fn expire_stale_bookings(&self) -> ServiceResult<Vec<Uuid>> {
        let Some(window) = self.settings.pending_expiry else {
            return Ok(Vec::new());
        };
        let cutoff = self.clock.now() - window;
        let expired = self.db.cancel_stale_bookings(cutoff).await?;
        if !expired.is_empty() {
            info!("Expired {} unpaid bookings created before {}", expired.len(), cutoff);
        }
        Ok(expired)
    }
}

fn with_booking_id(url: &str, booking_id: Uuid) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}bookingId={}", url, separator, booking_id)
}

//=========================================================================================
// Tests
//=========================================================================================
