use axum::http::{header::AUTHORIZATION, HeaderMap};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Domain separator for secret comparison tags
const SECRET_TAG_CONTEXT: &[u8] = b"agency-backup-server/shared-secret";

fn secret_tag(secret: &str) -> Option<HmacSha256> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return None;
        }
    };
    mac.update(SECRET_TAG_CONTEXT);
    Some(mac)
}

/// Compare a presented secret against the configured one in constant time
///
/// Both secrets are turned into HMAC tags and compared with `verify_slice`,
/// so neither length nor content leaks through timing. Empty secrets never match.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    if provided.is_empty() || expected.is_empty() {
        return false;
    }

    let (Some(provided_mac), Some(expected_mac)) = (secret_tag(provided), secret_tag(expected))
    else {
        return false;
    };

    let expected_tag = expected_mac.finalize().into_bytes();
    provided_mac.verify_slice(&expected_tag).is_ok()
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim())
}

/// Require a bearer token matching `expected`; a missing secret disables the endpoint
pub fn require_bearer(headers: &HeaderMap, expected: Option<&str>) -> Result<(), AppError> {
    let Some(expected) = expected else {
        tracing::warn!("Rejected request to an endpoint whose secret is not configured");
        return Err(AppError::Unauthorized);
    };

    match bearer_token(headers) {
        Some(token) if secrets_match(token, expected) => Ok(()),
        _ => {
            tracing::warn!("Invalid or missing bearer token");
            Err(AppError::Unauthorized)
        }
    }
}

/// Short SHA-256 fingerprint of a credential, safe to log
pub fn key_fingerprint(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..4])
}
