//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how each
//! failure is rendered as an HTTP response.

use crate::config::ConfigError;
use crate::web::envelope::Envelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use consultancy_core::{PortError, ServiceError};
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A business rule or adapter failure reported by a core service.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Login with an unknown email or a wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The request body or parameters could not be read.
    #[error("{0}")]
    BadRequest(String),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to apply the database migrations at startup.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        ApiError::Service(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Service(err) => match err {
                ServiceError::Validation(_) | ServiceError::InvalidDate(_) => StatusCode::BAD_REQUEST,
                ServiceError::Authentication => StatusCode::UNAUTHORIZED,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::InvalidState(_) => StatusCode::CONFLICT,
                ServiceError::SlotConflict { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                ServiceError::PaymentInit(_) | ServiceError::PaymentVerification(_) => {
                    StatusCode::BAD_GATEWAY
                }
                ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let envelope = match self {
            ApiError::Service(ServiceError::SlotConflict { suggestions }) => Envelope::conflict(
                "The selected time slot is no longer available. Please choose another.",
                suggestions,
            ),
            ApiError::Service(ServiceError::Authentication) => {
                Envelope::failure("Authentication required")
            }
            ApiError::Service(ServiceError::Persistence(_))
            | ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Migration(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => Envelope::failure("Internal server error"),
            other => Envelope::failure(other.to_string()),
        };
        (status, Json(envelope)).into_response()
    }
}

/// The result type returned by every handler.
pub type ApiResult<T> = Result<T, ApiError>;
