pub mod availability;
pub mod content;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod moderation;
pub mod ports;
pub mod reservation;
pub mod seed;
pub mod uploads;
pub mod validation;

#[cfg(any(test, feature = "test-util"))]
pub mod mocks;

pub use availability::{AvailabilityCalculator, SlotDefinition, SlotTemplate};
pub use content::{AboutForm, BlogPostForm, ContactForm, ContentService, TestimonialForm};
pub use domain::{
    About, AdminIdentity, BlogPost, Booking, BookingStatus, ContactMessage, PaymentOutcome,
    PaymentSession, PaymentStatus, Testimonial, TimeSlot, Upload,
};
pub use error::{ServiceError, ServiceResult};
pub use moderation::{ModerationService, PaymentLinkRequest};
pub use ports::{
    Clock, DatabaseService, FileStore, PaymentGateway, PortError, PortResult, SystemClock,
};
pub use reservation::{BookingRequest, ReservationService, ReservationSettings};
pub use seed::SeedContent;
