use sha2::{Digest, Sha256};

use super::block::Block;

/// Computes the SHA-256 digest of a byte sequence as a lowercase hex string
///
/// # Arguments
///
/// * `data` - The bytes to hash
///
/// # Returns
///
/// The 64-character hex encoding of the digest
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Computes the canonical SHA-256 digest of a block
///
/// The block's fields are rendered as a JSON object before hashing.
/// `serde_json` maps are backed by a tree keyed on the field name, so the
/// rendering is a function of field values only: two logically-equal blocks
/// hash identically no matter how they were assembled.
///
/// # Arguments
///
/// * `block` - The block to hash
///
/// # Returns
///
/// The hex-encoded digest of the block's canonical form
pub fn block_digest(block: &Block) -> String {
    let canonical = serde_json::json!({
        "index": block.index,
        "timestamp": block.timestamp,
        "transactions": block.transactions,
        "proof": block.proof,
        "previous_hash": block.previous_hash,
    });

    // Value::to_string cannot fail on a map built from serializable fields
    sha256_hex(canonical.to_string().as_bytes())
}
