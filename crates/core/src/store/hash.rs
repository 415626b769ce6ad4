//! Identity-keyed cache addressing.

use sha2::{Digest, Sha256};

/// Compute the identity key for a request URL.
pub fn request_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
