//! Content fingerprints for field values

use sha2::{Digest, Sha256};

/// Compute the SHA-256 fingerprint of a field value.
///
/// Fields are matched across edits by this value; collisions are tolerated
/// because same-hash fields are aligned by their order of occurrence.
pub fn content_hash(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}
