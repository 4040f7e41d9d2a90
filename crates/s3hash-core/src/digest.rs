//! SHA-256 digests of in-memory object bytes, and the output-line format.
//!
//! Fetched objects are hashed straight from memory; they never touch the
//! filesystem.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Render one output record: key, comma, digest as lowercase hex with the
/// `\x` bytea prefix. No trailing newline.
pub fn format_record(key: &str, digest: &[u8; 32]) -> String {
    format!("{},\\x{}", key, hex::encode(digest))
}
