//! HMAC-SHA256 request signing for the 3Commas v2 API.
//!
//! The signed message is `timestamp ‖ METHOD ‖ path`, where `path` includes the
//! query string (keys sorted) for GET requests. The signature is lowercase hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedHeaders {
    pub timestamp: String,
    pub signature: String,
}

/// `path` plus the query string in key order, or just `path` when there is none.
pub fn signing_path(path: &str, query: &[(&str, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let mut pairs: Vec<_> = query.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("{path}?{encoded}")
}

pub fn sign(secret: &str, timestamp_ms: i64, method: &str, signing_path: &str) -> SignedHeaders {
    let timestamp = timestamp_ms.to_string();
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("hmac accepts any key length"));
    mac.update(timestamp.as_bytes());
    mac.update(method.to_ascii_uppercase().as_bytes());
    mac.update(signing_path.as_bytes());
    SignedHeaders {
        timestamp,
        signature: hex::encode(mac.finalize().into_bytes()),
    }
}
