//! Token comparison, random tokens and submission digests.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Constant-time byte comparison.
///
/// Lengths are compared first; for equal lengths every byte is visited regardless of where the
/// first difference is.
pub fn timing_safe_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Generate a URL-safe random token (32 bytes, base64url without padding)
pub fn generate_token() -> String {
    use rand::RngCore;

    let mut token_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut token_bytes);

    URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Digest identifying one contact submission per sender, message and UTC day.
pub fn submission_digest(email: &str, content: &str, day: NaiveDate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase().as_bytes());
    hasher.update([0u8]);
    hasher.update(content.trim().as_bytes());
    hasher.update([0u8]);
    hasher.update(day.format("%Y-%m-%d").to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}
