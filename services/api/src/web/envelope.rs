//! services/api/src/web/envelope.rs
//!
//! The one response shape every JSON endpoint uses, and the serializable
//! views of the core domain types.

use chrono::{DateTime, NaiveDate, Utc};
use consultancy_core::domain::{
    About, BlogPost, Booking, ContactMessage, PaymentOutcome, PaymentSession, Testimonial,
    TimeSlot,
};
use serde::Serialize;
use uuid::Uuid;

//=========================================================================================
// Envelope
//=========================================================================================

/// `{success, data?, message?, suggestions?}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T = ()> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<SlotView>>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            suggestions: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Envelope<()> {
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            suggestions: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            suggestions: None,
        }
    }

    pub fn conflict(message: impl Into<String>, suggestions: Vec<TimeSlot>) -> Self {
        Self {
            suggestions: Some(suggestions.into_iter().map(SlotView::from).collect()),
            ..Self::failure(message)
        }
    }
}

//=========================================================================================
// Views
//=========================================================================================

#[derive(Debug, Serialize)]
pub struct SlotView {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available: bool,
}

impl From<TimeSlot> for SlotView {
    fn from(slot: TimeSlot) -> Self {
        Self {
            start: slot.start,
            end: slot.end,
            available: slot.available,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvailabilityView {
    pub date: NaiveDate,
    pub slots: Vec<SlotView>,
}

#[derive(Debug, Serialize)]
pub struct BookingView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub date: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub notes: Option<String>,
    pub file_url: Option<String>,
    pub status: &'static str,
    pub payment_status: &'static str,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingView {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            name: b.name,
            email: b.email,
            phone: b.phone,
            service: b.service,
            date: b.slot_start,
            end: b.slot_end,
            notes: b.notes,
            file_url: b.file_url,
            status: b.status.as_str(),
            payment_status: b.payment_status.as_str(),
            payment_reference: b.payment_reference,
            created_at: b.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentSessionView {
    pub booking_id: Option<Uuid>,
    pub reference: String,
    pub payment_url: String,
    pub amount_kobo: u64,
}

impl From<PaymentSession> for PaymentSessionView {
    fn from(s: PaymentSession) -> Self {
        Self {
            booking_id: s.booking_id,
            reference: s.reference,
            payment_url: s.payment_url,
            amount_kobo: s.amount_kobo,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerificationView {
    pub verified: bool,
    pub booking: BookingView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<PaymentOutcome> for VerificationView {
    fn from(outcome: PaymentOutcome) -> Self {
        match outcome {
            PaymentOutcome::Confirmed(booking) | PaymentOutcome::AlreadyConfirmed(booking) => Self {
                verified: true,
                booking: booking.into(),
                reason: None,
            },
            PaymentOutcome::Failed { booking, reason } => Self {
                verified: false,
                booking: booking.into(),
                reason: Some(reason),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TestimonialView {
    pub id: Uuid,
    pub name: String,
    pub org: Option<String>,
    pub rating: Option<i32>,
    pub text: String,
    pub photo: Option<String>,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Testimonial> for TestimonialView {
    fn from(t: Testimonial) -> Self {
        Self {
            id: t.id,
            name: t.name,
            org: t.org,
            rating: t.rating,
            text: t.text,
            photo: t.photo,
            approved: t.approved,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BlogPostView {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BlogPost> for BlogPostView {
    fn from(p: BlogPost) -> Self {
        Self {
            id: p.id,
            title: p.title,
            slug: p.slug,
            content: p.content,
            image: p.image,
            tags: p.tags,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AboutView {
    pub id: Uuid,
    pub content: String,
    pub image: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<About> for AboutView {
    fn from(a: About) -> Self {
        Self {
            id: a.id,
            content: a.content,
            image: a.image,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactMessageView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<ContactMessage> for ContactMessageView {
    fn from(m: ContactMessage) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            subject: m.subject,
            message: m.message,
            created_at: m.created_at,
        }
    }
}

/// Converts every item of a list into its view.
pub fn views<T, V: From<T>>(items: Vec<T>) -> Vec<V> {
    items.into_iter().map(V::from).collect()
}
