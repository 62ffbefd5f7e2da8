//! crates/consultancy_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Bookings
//=========================================================================================

/// Lifecycle status of a booking. Only `Cancelled` releases the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Whether a booking in this status holds its slot.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("'{}' is not a booking status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(format!("'{}' is not a payment status", other)),
        }
    }
}

/// A consultation booking against one slot of the daily template.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
    pub notes: Option<String>,
    pub file_url: Option<String>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    /// Gateway reference of the payment that confirmed this booking.
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated booking, ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
    pub notes: Option<String>,
    pub file_url: Option<String>,
}

/// A bookable window of a given day. Derived on every query, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available: bool,
}

//=========================================================================================
// Payments
//=========================================================================================

/// A hosted checkout created at the payment gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSession {
    /// `None` for ad-hoc payment links created by an administrator.
    pub booking_id: Option<Uuid>,
    pub reference: String,
    pub payment_url: String,
    pub amount_kobo: u64,
    pub created_at: DateTime<Utc>,
}

/// What the gateway is asked to collect.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub email: String,
    pub amount_kobo: u64,
    pub reference: String,
    pub callback_url: Option<String>,
    pub metadata: Vec<(String, String)>,
}

/// The hosted checkout the gateway created for a `PaymentRequest`.
#[derive(Debug, Clone, PartialEq)]
pub struct HostedCheckout {
    pub authorization_url: String,
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayTransactionStatus {
    Success,
    Failed,
    Abandoned,
    Pending,
}

/// The gateway's view of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayTransaction {
    pub reference: String,
    pub status: GatewayTransactionStatus,
    pub amount_kobo: u64,
    pub gateway_response: Option<String>,
}

/// Result of `ReservationService::verify_payment`.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    /// This call moved the booking to confirmed/paid.
    Confirmed(Booking),
    /// The booking was already paid; nothing changed.
    AlreadyConfirmed(Booking),
    /// The payment did not go through; the booking is still pending/unpaid.
    Failed { booking: Booking, reason: String },
}

impl PaymentOutcome {
    pub fn booking(&self) -> &Booking {
        match self {
            PaymentOutcome::Confirmed(booking) | PaymentOutcome::AlreadyConfirmed(booking) => booking,
            PaymentOutcome::Failed { booking, .. } => booking,
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, PaymentOutcome::Failed { .. })
    }
}

//=========================================================================================
// Administrators
//=========================================================================================

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub admin_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// A persisted bearer-token session.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub token: String,
    pub admin_id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// The administrator a request was authenticated as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub admin_id: Uuid,
    pub email: String,
}

//=========================================================================================
// Site content
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Testimonial {
    pub id: Uuid,
    pub name: String,
    pub org: Option<String>,
    pub rating: Option<i32>,
    pub text: String,
    pub photo: Option<String>,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTestimonial {
    pub name: String,
    pub org: Option<String>,
    pub rating: Option<i32>,
    pub text: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Field values for creating or replacing a blog post.
#[derive(Debug, Clone)]
pub struct BlogPostDraft {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image: Option<String>,
    pub tags: Vec<String>,
}

/// The single "about us" record.
#[derive(Debug, Clone, PartialEq)]
pub struct About {
    pub id: Uuid,
    pub content: String,
    pub image: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

/// An uploaded file held in memory until it is handed to a `FileStore`.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}
