//! API key generation, parsing, and verification.
//!
//! A credential is the composite string `yt_<keyId>_<secret>`:
//! - `keyId`: 32 hex characters (16 random bytes), public, used for lookup
//! - `secret`: 64 hex characters (32 random bytes), private
//!
//! Only the `keyId` and a SHA-256 digest of the secret are persisted. The
//! composite string is handed to the operator once at creation and is not
//! recoverable afterwards.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::{models::api_key::ApiKey, store::KeyStore};

/// Prefix identifying our composite key format.
const KEY_PREFIX: &str = "yt";

/// Freshly generated credential material.
///
/// `api_key` is the composite string shown to the operator exactly once.
/// Only `key_id` and `key_hash` may be persisted.
#[derive(Debug)]
pub struct GeneratedKey {
    pub key_id: String,
    pub key_secret: String,
    pub key_hash: String,
    pub api_key: String,
}

/// Generate a new credential from the thread-local CSPRNG.
pub fn generate() -> GeneratedKey {
    let id_bytes: [u8; 16] = rand::random();
    let secret_bytes: [u8; 32] = rand::random();

    let key_id = hex::encode(id_bytes);
    let key_secret = hex::encode(secret_bytes);

    // The digest covers the secret half only, not the composite string
    let key_hash = sha256_hex(&key_secret);
    let api_key = format!("{KEY_PREFIX}_{key_id}_{key_secret}");

    GeneratedKey {
        key_id,
        key_secret,
        key_hash,
        api_key,
    }
}

/// A presented credential split into its parts. Borrows from the header
/// value; nothing here is persisted.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedKey<'a> {
    pub key_id: &'a str,
    pub key_secret: &'a str,
}

/// Parse a presented credential string.
///
/// Valid form: exactly three `_`-delimited segments, the first being the
/// literal `yt` prefix. Anything else is rejected here, before any storage
/// access, so malformed input never reaches the store.
pub fn parse_api_key(candidate: &str) -> Option<ParsedKey<'_>> {
    let mut parts = candidate.split('_');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(prefix), Some(key_id), Some(key_secret), None)
            if prefix == KEY_PREFIX && !key_id.is_empty() && !key_secret.is_empty() =>
        {
            Some(ParsedKey { key_id, key_secret })
        }
        _ => None,
    }
}

/// Verify a parsed credential against the store.
///
/// Lookup is by `key_id` with `is_active = true`; unknown id, inactive key,
/// and wrong secret all collapse into the same `None`, so callers cannot
/// probe which keys exist. The digest comparison is constant-time over
/// fixed-length buffers. Store errors are logged and treated as a failed
/// verification (fail closed).
pub async fn verify(store: &dyn KeyStore, key_id: &str, key_secret: &str) -> Option<ApiKey> {
    let record = match store.find_active_by_key_id(key_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return None,
        Err(err) => {
            tracing::warn!(error = %err, "key lookup failed; denying request");
            return None;
        }
    };

    let presented: [u8; 32] = Sha256::digest(key_secret.as_bytes()).into();
    let stored = match hex::decode(&record.key_hash) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::error!(key_id, "stored key hash is not valid hex");
            return None;
        }
    };

    if constant_time_eq(&presented, &stored) {
        Some(record)
    } else {
        None
    }
}

/// SHA-256 hash the input, returning the hex-encoded digest.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time byte comparison.
///
/// For equal-length inputs the cost does not depend on where the first
/// mismatched byte occurs. Length is the only thing short-circuited, and
/// both sides here are fixed-length digests.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
