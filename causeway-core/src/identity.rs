//! Identity helpers: content hashes and request ids

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// SHA-256 content hash.
pub type ContentHash = [u8; 32];

/// Compute SHA-256 hash of content.
pub fn compute_content_hash(content: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Generate a timestamp-sortable request id for correlating log lines.
pub fn new_request_id() -> String {
    Uuid::now_v7().to_string()
}
