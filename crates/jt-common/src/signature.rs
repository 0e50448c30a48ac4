//! Content signatures.
//!
//! Caches are keyed by what a value contains, never by where it lives, so two
//! structurally equal networks share cache entries and a modified copy never
//! hits a stale one.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// SHA-256 of the canonical JSON serialization of `value`, hex encoded.
///
/// Map-typed fields must use ordered maps for the encoding to be canonical.
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let bytes = serde_json::to_vec(value)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
