//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use consultancy_core::availability::DEFAULT_LOOKAHEAD_DAYS;
use consultancy_core::reservation::{DEFAULT_CONSULTATION_FEE_KOBO, DEFAULT_PENDING_EXPIRY_MINUTES};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Credentials for the administrator created or refreshed at start-up.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,

    // --- Uploads ---
    pub uploads_dir: PathBuf,
    pub uploads_url_prefix: String,
    pub max_upload_bytes: usize,

    // --- Payments ---
    pub paystack_secret_key: Option<String>,
    pub paystack_base_url: String,
    pub payment_callback_url: Option<String>,
    pub consultation_fee_kobo: u64,

    // --- Bookings ---
    pub booking_lookahead_days: i64,
    /// `None` disables the expiry sweep.
    pub pending_expiry_minutes: Option<i64>,
    pub expiry_sweep_interval_secs: u64,

    // --- Admin and site ---
    pub admin_session_hours: i64,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub cors_origin: String,
    pub seed_content: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // --- Server and Database Settings ---
        let bind_address = parse_var(&var, "BIND_ADDRESS")?
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let database_url =
            var("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Uploads ---
        let uploads_dir = var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./public/uploads"));
        let uploads_url_prefix = var("UPLOADS_URL_PREFIX")
            .map(|p| p.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "/uploads".to_string());
        let max_upload_bytes = parse_or(&var, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?;

        // --- Payments ---
        let paystack_secret_key = var("PAYSTACK_SECRET_KEY");
        let paystack_base_url = var("PAYSTACK_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "https://api.paystack.co".to_string());
        let payment_callback_url = var("PAYMENT_CALLBACK_URL");
        let consultation_fee_kobo =
            parse_or(&var, "CONSULTATION_FEE_KOBO", DEFAULT_CONSULTATION_FEE_KOBO)?;
        if consultation_fee_kobo == 0 {
            return Err(invalid("CONSULTATION_FEE_KOBO", "must be greater than zero"));
        }

        // --- Bookings ---
        let booking_lookahead_days =
            parse_or(&var, "BOOKING_LOOKAHEAD_DAYS", DEFAULT_LOOKAHEAD_DAYS)?;
        if booking_lookahead_days < 0 {
            return Err(invalid("BOOKING_LOOKAHEAD_DAYS", "must not be negative"));
        }
        let pending_expiry: i64 =
            parse_or(&var, "PENDING_EXPIRY_MINUTES", DEFAULT_PENDING_EXPIRY_MINUTES)?;
        let pending_expiry_minutes = match pending_expiry {
            0 => None,
            m if m < 0 => return Err(invalid("PENDING_EXPIRY_MINUTES", "must not be negative")),
            m => Some(m),
        };
        let expiry_sweep_interval_secs = parse_or(&var, "EXPIRY_SWEEP_INTERVAL_SECS", 300u64)?;
        if expiry_sweep_interval_secs == 0 {
            return Err(invalid("EXPIRY_SWEEP_INTERVAL_SECS", "must be greater than zero"));
        }

        // --- Admin and site ---
        let admin_session_hours = parse_or(&var, "ADMIN_SESSION_HOURS", 1i64)?;
        if admin_session_hours <= 0 {
            return Err(invalid("ADMIN_SESSION_HOURS", "must be greater than zero"));
        }
        let bootstrap_admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingVar("ADMIN_PASSWORD".to_string())),
            (None, Some(_)) => return Err(ConfigError::MissingVar("ADMIN_EMAIL".to_string())),
        };
        let cors_origin = var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());
        let seed_content = parse_or(&var, "SEED_CONTENT", false)?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            uploads_dir,
            uploads_url_prefix,
            max_upload_bytes,
            paystack_secret_key,
            paystack_base_url,
            payment_callback_url,
            consultation_fee_kobo,
            booking_lookahead_days,
            pending_expiry_minutes,
            expiry_sweep_interval_secs,
            admin_session_hours,
            bootstrap_admin,
            cors_origin,
            seed_content,
        })
    }
}

/// Parses `key` when it is set.
fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| invalid(key, &format!("'{}': {}", raw, e)))
        })
        .transpose()
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_var(var, key)?.unwrap_or(default))
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue(key.to_string(), reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_is_set() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/consultancy")]).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.uploads_url_prefix, "/uploads");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.consultation_fee_kobo, 5_000_000);
        assert_eq!(config.pending_expiry_minutes, Some(1440));
        assert_eq!(config.admin_session_hours, 1);
        assert_eq!(config.cors_origin, "http://localhost:5173");
        assert!(config.bootstrap_admin.is_none());
        assert!(!config.seed_content);
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingVar(v)) if v == "DATABASE_URL"));
    }

    #[test]
    fn zero_expiry_disables_the_sweep() {
        let config = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("PENDING_EXPIRY_MINUTES", "0"),
            ("SEED_CONTENT", "true"),
            ("PAYSTACK_BASE_URL", "http://127.0.0.1:9999/"),
        ])
        .unwrap();
        assert_eq!(config.pending_expiry_minutes, None);
        assert!(config.seed_content);
        assert_eq!(config.paystack_base_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn malformed_values_are_rejected() {
        for (key, value) in [
            ("BIND_ADDRESS", "nowhere"),
            ("RUST_LOG", "chatty"),
            ("CONSULTATION_FEE_KOBO", "-5"),
            ("ADMIN_SESSION_HOURS", "0"),
            ("SEED_CONTENT", "maybe"),
        ] {
            let result = load(&[("DATABASE_URL", "postgres://x"), (key, value)]);
            assert!(
                matches!(result, Err(ConfigError::InvalidValue(ref k, _)) if k == key),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }

    #[test]
    fn bootstrap_admin_needs_both_halves() {
        let err = load(&[("DATABASE_URL", "postgres://x"), ("ADMIN_EMAIL", "a@b.co")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(v) if v == "ADMIN_PASSWORD"));
        let config = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("ADMIN_EMAIL", "a@b.co"),
            ("ADMIN_PASSWORD", "s3cret"),
        ])
        .unwrap();
        assert_eq!(config.bootstrap_admin.unwrap().email, "a@b.co");
    }
}
