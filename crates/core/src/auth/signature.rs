//! Signature classification
//!
//! A signature is either a structured token (three base64url segments with a
//! JSON header) or an opaque credential forwarded verbatim. Feed signatures
//! carry a scope prefix separated by a space, e.g. `user1 <token>`; only the
//! trailing segment is inspected.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use feedstream_domain::{FeedError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::auth::SignatureKind;

static TOKEN_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*$")
        .expect("TOKEN_SHAPE pattern is valid and well-formed")
});

/// Segment after the last space, or the whole string when there is none.
pub fn trailing_segment(signature: &str) -> &str {
    signature.rsplit(' ').next().unwrap_or(signature)
}

/// Classify a signature as a structured token or an opaque credential.
pub fn classify(signature: &str) -> SignatureKind {
    let candidate = trailing_segment(signature);
    if !TOKEN_SHAPE.is_match(candidate) {
        return SignatureKind::Simple;
    }

    let header = candidate.split('.').next().unwrap_or_default();
    match decode_segment(header) {
        Ok(Value::Object(_)) => SignatureKind::Jwt,
        _ => SignatureKind::Simple,
    }
}

/// Value carried in the `Authorization` header for a classified signature.
pub fn auth_header_value(signature: &str, kind: SignatureKind) -> &str {
    match kind {
        SignatureKind::Jwt => trailing_segment(signature),
        SignatureKind::Simple => signature,
    }
}

/// Decode the claims of a structured token without verifying it.
///
/// Used in client mode, where the client never holds the secret needed to
/// verify its own token.
///
/// # Errors
/// Returns `FeedError::Validation` if the token is not structured or its
/// payload is not a JSON object.
pub fn decode_claims(token: &str) -> Result<Map<String, Value>> {
    let token = trailing_segment(token);
    if classify(token) != SignatureKind::Jwt {
        return Err(FeedError::Validation("token is not a structured token".into()));
    }

    let payload = token.split('.').nth(1).unwrap_or_default();
    match decode_segment(payload) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(_) => Err(FeedError::Validation("token payload is not an object".into())),
        Err(message) => Err(FeedError::Validation(message)),
    }
}

fn decode_segment(segment: &str) -> std::result::Result<Value, String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| format!("invalid base64url segment: {}", e))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("segment is not JSON: {}", e))
}
