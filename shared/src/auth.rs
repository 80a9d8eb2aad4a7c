//! Shared-secret authorization for write endpoints.

use crate::{Error, Result};

/// Check an `Authorization` header value against `Bearer <secret>`.
///
/// An empty configured secret never authorizes anything.
pub fn verify_bearer(header: Option<&str>, secret: &str) -> Result<()> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| Error::Auth("unauthorized".to_string()))?;

    if secret.is_empty() || !constant_time_eq(token.as_bytes(), secret.as_bytes()) {
        return Err(Error::Auth("unauthorized".to_string()));
    }
    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
