//! crates/consultancy_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{
    About, AdminCredentials, AdminSession, BlogPost, BlogPostDraft, Booking, BookingStatus,
    ContactMessage, GatewayTransaction, HostedCheckout, NewBooking, NewContactMessage,
    NewTestimonial, PaymentRequest, PaymentSession, Testimonial, Upload,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// The adapter refused the input (e.g. an upload of a disallowed type).
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Administrators ---
    /// Creates the administrator, or replaces the password hash if the email exists.
    async fn upsert_admin(&self, email: &str, hashed_password: &str) -> PortResult<Uuid>;

    async fn get_admin_by_email(&self, email: &str) -> PortResult<AdminCredentials>;

    async fn create_admin_session(
        &self,
        token: &str,
        admin_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn get_admin_session(&self, token: &str) -> PortResult<AdminSession>;

    async fn delete_admin_session(&self, token: &str) -> PortResult<()>;

    // --- Bookings ---
    /// Inserts a pending, unpaid booking. Fails with `PortError::Conflict` when a
    /// non-cancelled booking already holds the same slot start.
    async fn insert_booking(&self, booking: NewBooking) -> PortResult<Booking>;

    async fn get_booking(&self, booking_id: Uuid) -> PortResult<Booking>;

    /// All bookings, newest first.
    async fn list_bookings(&self) -> PortResult<Vec<Booking>>;

    /// Slot starts held by pending or confirmed bookings in `[from, to)`.
    async fn occupied_slot_starts(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> PortResult<Vec<DateTime<Utc>>>;

    async fn set_booking_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> PortResult<Booking>;

    /// Moves an unpaid booking to confirmed/paid. Returns `None` when the booking
    /// was already paid, so only one caller ever performs the transition.
    async fn mark_booking_paid(
        &self,
        booking_id: Uuid,
        reference: &str,
    ) -> PortResult<Option<Booking>>;

    /// Cancels pending, unpaid bookings created before `created_before` and
    /// returns their ids. A booking with a payment session opened at or after
    /// `created_before` is left alone, since its checkout may still complete.
    async fn cancel_stale_bookings(&self, created_before: DateTime<Utc>) -> PortResult<Vec<Uuid>>;

    // --- Payment sessions ---
    async fn save_payment_session(&self, session: &PaymentSession) -> PortResult<()>;

    async fn find_payment_session(
        &self,
        booking_id: Uuid,
        reference: &str,
    ) -> PortResult<Option<PaymentSession>>;

    // --- Testimonials ---
    async fn create_testimonial(&self, testimonial: NewTestimonial) -> PortResult<Testimonial>;

    /// Newest first; `approved_only` restricts to moderated entries.
    async fn list_testimonials(&self, approved_only: bool) -> PortResult<Vec<Testimonial>>;

    async fn approve_testimonial(&self, testimonial_id: Uuid) -> PortResult<Testimonial>;

    /// Removes the testimonial and returns the deleted record.
    async fn delete_testimonial(&self, testimonial_id: Uuid) -> PortResult<Testimonial>;

    // --- Blog ---
    async fn create_blog_post(&self, draft: BlogPostDraft) -> PortResult<BlogPost>;

    async fn update_blog_post(&self, post_id: Uuid, draft: BlogPostDraft) -> PortResult<BlogPost>;

    async fn get_blog_post(&self, post_id: Uuid) -> PortResult<BlogPost>;

    async fn get_blog_post_by_slug(&self, slug: &str) -> PortResult<BlogPost>;

    async fn list_blog_posts(&self) -> PortResult<Vec<BlogPost>>;

    async fn delete_blog_post(&self, post_id: Uuid) -> PortResult<BlogPost>;

    // --- About ---
    async fn get_about(&self) -> PortResult<Option<About>>;

    async fn save_about(&self, content: &str, image: Option<&str>) -> PortResult<About>;

    // --- Contact messages ---
    async fn create_contact_message(&self, message: NewContactMessage) -> PortResult<ContactMessage>;

    async fn list_contact_messages(&self) -> PortResult<Vec<ContactMessage>>;

    async fn get_contact_message(&self, message_id: Uuid) -> PortResult<ContactMessage>;

    async fn delete_contact_message(&self, message_id: Uuid) -> PortResult<ContactMessage>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a hosted checkout for the request.
    async fn initialize(&self, request: &PaymentRequest) -> PortResult<HostedCheckout>;

    /// Looks up the outcome of a transaction by its reference.
    async fn verify(&self, reference: &str) -> PortResult<GatewayTransaction>;
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores the upload and returns the public path it is served from.
    async fn save(&self, upload: &Upload) -> PortResult<String>;

    /// Removes a file previously returned by `save`.
    async fn delete(&self, public_path: &str) -> PortResult<()>;
}

/// Source of the current time, injected so date rules are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The server's wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
