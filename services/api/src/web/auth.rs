//! services/api/src/web/auth.rs
//!
//! Administrator login and logout. Passwords are stored as Argon2 hashes;
//! a successful login issues an opaque bearer token persisted as a session.

use crate::error::{ApiError, ApiResult};
use crate::web::envelope::Envelope;
use crate::web::extract::ApiJson;
use crate::web::state::AppState;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::HeaderMap, response::IntoResponse, Extension, Json};
use chrono::{DateTime, Utc};
use consultancy_core::credentials::{bearer_token, issue_token};
use consultancy_core::{AdminIdentity, PortError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub email: String,
}

//=========================================================================================
// Password Hashing
//=========================================================================================

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

fn verify_password(password: &str, hashed: &str) -> ApiResult<bool> {
    let parsed_hash = PasswordHash::new(hashed).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /admin/login - Exchange email and password for a bearer token
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.trim().to_lowercase();
    let credentials = match state.db.get_admin_by_email(&email).await {
        Ok(credentials) => credentials,
        Err(PortError::NotFound(_)) => {
            warn!("Login attempt for unknown admin {}", email);
            return Err(ApiError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    if !verify_password(&req.password, &credentials.hashed_password)? {
        warn!("Wrong password for admin {}", email);
        return Err(ApiError::InvalidCredentials);
    }

    let issued = issue_token(state.clock.now(), state.admin_session_ttl());
    state
        .db
        .create_admin_session(&issued.token, credentials.admin_id, issued.expires_at)
        .await?;
    info!("Admin {} logged in", credentials.email);

    Ok(Json(Envelope::ok(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        email: credentials.email,
    })))
}

/// POST /admin/logout - Invalidate the presented token
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = bearer_token(header)?;
    state.db.delete_admin_session(token).await?;
    info!("Admin {} logged out", admin.email);
    Ok(Json(Envelope::done("Logged out")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_only_the_original_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
        assert!(verify_password("x", "not-a-hash").is_err());
    }
}
