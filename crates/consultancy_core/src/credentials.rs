//! crates/consultancy_core/src/credentials.rs
//!
//! Administrator bearer tokens. Resolving a token depends only on the request
//! header, the stored session and the clock; nothing is kept in process memory.

use crate::domain::{AdminIdentity, AdminSession};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{Clock, DatabaseService, PortError};
use chrono::{DateTime, Duration, Utc};
use tracing::warn;
use uuid::Uuid;

/// A freshly minted token and the moment it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn issue_token(now: DateTime<Utc>, ttl: Duration) -> IssuedToken {
    IssuedToken {
        token: Uuid::new_v4().to_string(),
        expires_at: now + ttl,
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> ServiceResult<&str> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ServiceError::Authentication)
}

/// Accepts a stored session only while it has not expired.
pub fn check_session(session: AdminSession, now: DateTime<Utc>) -> ServiceResult<AdminIdentity> {
    if session.expires_at <= now {
        warn!("Rejected expired admin session for {}", session.email);
        return Err(ServiceError::Authentication);
    }
    Ok(AdminIdentity {
        admin_id: session.admin_id,
        email: session.email,
    })
}

/// Resolves the `Authorization` header of a request to an administrator.
pub async fn authenticate(
    db: &dyn DatabaseService,
    clock: &dyn Clock,
    authorization: Option<&str>,
) -> ServiceResult<AdminIdentity> {
    let token = bearer_token(authorization)?;
    let session = match db.get_admin_session(token).await {
        Ok(session) => session,
        Err(PortError::NotFound(_)) | Err(PortError::Unauthorized) => {
            return Err(ServiceError::Authentication)
        }
        Err(e) => return Err(e.into()),
    };
    check_session(session, clock.now())
}
