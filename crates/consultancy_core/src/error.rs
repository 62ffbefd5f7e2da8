//! crates/consultancy_core/src/error.rs
//!
//! The error taxonomy returned by the core services to the API layer.

use crate::domain::TimeSlot;
use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Missing or malformed input. The caller must correct it before retrying.
    #[error("{0}")]
    Validation(String),

    /// The requested date or slot is outside the bookable window.
    #[error("{0}")]
    InvalidDate(String),

    /// Another booking took the slot first. Carries the slots still free that day.
    #[error("The selected time slot is no longer available")]
    SlotConflict { suggestions: Vec<TimeSlot> },

    #[error("Authentication required")]
    Authentication,

    #[error("{0}")]
    NotFound(String),

    /// The record exists but is not in a state that allows the operation.
    #[error("{0}")]
    InvalidState(String),

    #[error("Payment initialization failed: {0}")]
    PaymentInit(String),

    #[error("Payment verification failed: {0}")]
    PaymentVerification(String),

    #[error("Storage error: {0}")]
    Persistence(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<PortError> for ServiceError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => ServiceError::NotFound(what),
            PortError::Invalid(why) => ServiceError::Validation(why),
            PortError::Unauthorized => ServiceError::Authentication,
            PortError::Conflict(what) => ServiceError::Persistence(what),
            PortError::Unexpected(what) => ServiceError::Persistence(what),
        }
    }
}
