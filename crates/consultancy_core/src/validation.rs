//! crates/consultancy_core/src/validation.rs
//!
//! Input checks shared by the booking and content services.

use crate::error::{ServiceError, ServiceResult};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// The consultation services a booking may request.
pub const SERVICES: [&str; 6] = [
    "Media Relations",
    "Crisis Communication Management",
    "Brand Storytelling",
    "Language Interpretation",
    "Language Translation",
    "Bespoke Consultancy",
];

fn email_pattern() -> Result<&'static Regex, &'static regex::Error> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"))
        .as_ref()
}

/// Returns the trimmed value, or a `Validation` error naming the field.
pub fn required(field: &str, value: Option<&str>) -> ServiceResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ServiceError::Validation(format!("{} is required", field))),
    }
}

/// Trims an optional value, mapping blank to `None`.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn validate_email(email: &str) -> ServiceResult<()> {
    let pattern = email_pattern().map_err(|e| {
        ServiceError::Validation(format!("email address could not be checked: {}", e))
    })?;
    if pattern.is_match(email) {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "'{}' is not a valid email address",
            email
        )))
    }
}

pub fn validate_service(service: &str) -> ServiceResult<()> {
    if SERVICES.contains(&service) {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "'{}' is not one of the offered services",
            service
        )))
    }
}

/// Parses a slot timestamp. Accepts RFC 3339 and `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn parse_timestamp(field: &str, raw: &str) -> ServiceResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(ServiceError::Validation(format!(
        "{} must be a timestamp such as 2025-06-10T09:00:00Z",
        field
    )))
}

/// Parses a 1-5 star rating. Blank means "no rating".
pub fn parse_rating(raw: Option<&str>) -> ServiceResult<Option<i32>> {
    let Some(raw) = optional(raw) else {
        return Ok(None);
    };
    match raw.parse::<i32>() {
        Ok(r) if (1..=5).contains(&r) => Ok(Some(r)),
        _ => Err(ServiceError::Validation(
            "rating must be a whole number from 1 to 5".to_string(),
        )),
    }
}

/// URL slug for a blog title: lowercase, `[a-z0-9 -]` only, whitespace to `-`,
/// runs of `-` collapsed.
pub fn slugify(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ' || *c == '-')
        .collect();
    let mut slug = String::with_capacity(kept.len());
    for c in kept.chars() {
        let c = if c == ' ' { '-' } else { c };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug
}

/// Splits a comma-separated tag list, dropping empty entries.
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|tags| {
        tags.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_and_trims() {
        assert!(required("name", None).is_err());
        assert!(required("name", Some("   ")).is_err());
        assert_eq!(required("name", Some("  Ada ")).unwrap(), "Ada");
    }

    #[test]
    fn email_validation() {
        assert!(email_pattern().is_ok());
        assert!(validate_email("ada@example.com").is_ok());
        for bad in ["ada", "ada@", "@example.com", "ada@example", "a da@example.com"] {
            assert!(validate_email(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn timestamps_in_both_formats() {
        let a = parse_timestamp("date", "2025-06-10T09:00:00Z").unwrap();
        let b = parse_timestamp("date", "2025-06-10 09:00:00").unwrap();
        let c = parse_timestamp("date", "2025-06-10T10:00:00+01:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(parse_timestamp("date", "next tuesday").is_err());
    }

    #[test]
    fn slugs_match_title_rules() {
        assert_eq!(
            slugify("The Future of Strategic Communications"),
            "the-future-of-strategic-communications"
        );
        assert_eq!(slugify("Crisis -- PR: 101!"), "crisis-pr-101");
    }

    #[test]
    fn ratings_and_tags() {
        assert_eq!(parse_rating(None).unwrap(), None);
        assert_eq!(parse_rating(Some("4")).unwrap(), Some(4));
        assert!(parse_rating(Some("6")).is_err());
        assert_eq!(parse_tags(Some(" PR, ,Crisis ")), vec!["PR", "Crisis"]);
        assert!(parse_tags(None).is_empty());
    }
}
