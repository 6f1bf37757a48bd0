//! Input validation shared by the public endpoints.
//!
//! Lengths are counted in characters after trimming; Korean names and messages are multi-byte.

use regex::Regex;
use std::sync::LazyLock;

use crate::errors::Error;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$").expect("static regex is valid"));

const MAX_EMAIL_LEN: usize = 254;

/// Trimmed email, or `invalid_email`
pub fn validate_email(input: &str) -> Result<String, Error> {
    let email = input.trim();
    if email.len() > MAX_EMAIL_LEN || !EMAIL.is_match(email) {
        return Err(Error::InvalidEmail);
    }
    Ok(email.to_string())
}

/// Trimmed text whose length must lie in `min..=max` characters
pub fn bounded_text(field: &str, input: &str, min: usize, max: usize) -> Result<String, Error> {
    let text = input.trim();
    let len = text.chars().count();
    if len < min || len > max {
        return Err(Error::InvalidInput {
            message: format!("{field} must be between {min} and {max} characters"),
        });
    }
    Ok(text.to_string())
}

/// Optional trimmed text of at most `max` characters. Blank becomes `None`.
pub fn optional_text(field: &str, input: Option<&str>, max: usize) -> Result<Option<String>, Error> {
    let Some(text) = input.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > max {
        return Err(Error::InvalidInput {
            message: format!("{field} must be at most {max} characters"),
        });
    }
    Ok(Some(text.to_string()))
}
