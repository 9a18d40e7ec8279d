//! Request signing for calls to the cloud service.
//!
//! The signature is `hex(HMAC_SHA256(secret, "POST\n{uri}\n{timestamp}\n{sha256hex(body)}"))`
//! and travels in four headers together with the access key, timestamp and a
//! random nonce. An empty secret produces an empty signature; the headers are
//! still sent.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use rand::RngCore;
use reqwest::header::{HeaderMap, HeaderValue};
use sha2::{Digest, Sha256};

pub type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ACCESS_KEY: &str = "X-Access-Key";
pub const HEADER_SIGNATURE: &str = "X-Signature";
pub const HEADER_TIMESTAMP: &str = "X-Timestamp";
pub const HEADER_NONCE: &str = "X-Nonce";

/// Number of random bytes in a nonce (hex-encoded to twice as many chars).
pub const NONCE_LEN: usize = 16;

/// Compute the request signature. Pure: same inputs, same output.
pub fn calculate_signature(
    secret: &str,
    method: &str,
    path: &str,
    timestamp: &str,
    body_hash: &str,
) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let payload = [method, path, timestamp, body_hash].join("\n");
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// SHA-256 of the raw request body, hex-encoded.
pub fn body_hash(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Random hex string built from `len` bytes of OS randomness.
pub fn generate_nonce(len: usize) -> String {
    let mut buf = vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Current Unix time in seconds as a decimal string.
pub fn unix_timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string()
}

/// The four signature headers for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    pub access_key: String,
    pub timestamp: String,
    pub nonce: String,
    pub signature: String,
}

impl SignatureHeaders {
    /// Sign `body` for `method path` at `timestamp` with a fresh nonce.
    pub fn sign(
        secret: &str,
        access_key: &str,
        method: &str,
        path: &str,
        timestamp: String,
        body: &[u8],
    ) -> Self {
        let signature = calculate_signature(secret, method, path, &timestamp, &body_hash(body));
        Self {
            access_key: access_key.to_string(),
            timestamp,
            nonce: generate_nonce(NONCE_LEN),
            signature,
        }
    }

    /// Header map with all four headers; the signature header is present even when empty.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let pairs = [
            (HEADER_ACCESS_KEY, &self.access_key),
            (HEADER_TIMESTAMP, &self.timestamp),
            (HEADER_NONCE, &self.nonce),
            (HEADER_SIGNATURE, &self.signature),
        ];
        for (name, value) in pairs {
            // app ids, digits and hex are always valid header values
            if let Ok(v) = HeaderValue::from_str(value) {
                headers.insert(name, v);
            }
        }
        headers
    }
}
