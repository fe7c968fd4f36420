//! Hashing & signature adapter.
//!
//! Signature verification here is an opaque length predicate standing in
//! for a real ECDSA verifier; a production implementation substitutes an
//! ECDSA verifier behind the same predicate.

use crate::types::Block;
use sha2::{Digest, Sha256};

/// Block hash = hex(SHA-256(concat(index, ISO-8601 timestamp,
/// previous_hash, nonce, total_reduction, payload_digest))), uppercase,
/// hyphenless.
pub fn hash_block(block: &Block) -> String {
    let mut hasher = Sha256::new();
    hasher.update(block.index.to_string().as_bytes());
    hasher.update(block.timestamp.to_rfc3339().as_bytes());
    hasher.update(block.previous_hash.as_bytes());
    hasher.update(block.nonce.to_string().as_bytes());
    hasher.update(block.total_carbon_reduction.to_string().as_bytes());
    hasher.update(block.payload.digest_pieces().as_bytes());
    hex::encode_upper(hasher.finalize())
}

/// `true` if `hash` has at least `difficulty` leading '0' hex characters.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let target = "0".repeat(difficulty as usize);
    hash.starts_with(&target)
}

/// Transaction signature predicate: hex string of length 128.
pub fn verify_transaction_signature(signature: &str) -> bool {
    is_hex_of_len(signature, 128)
}

/// Inverter sample signature predicate: hex string of length 64.
pub fn verify_sample_signature(signature: &str) -> bool {
    is_hex_of_len(signature, 64)
}

fn is_hex_of_len(candidate: &str, len: usize) -> bool {
    candidate.len() == len && candidate.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_signature_requires_128_hex_chars() {
        assert!(verify_transaction_signature(&"a".repeat(128)));
        assert!(!verify_transaction_signature(&"a".repeat(127)));
        assert!(!verify_transaction_signature(&"z".repeat(128)));
    }

    #[test]
    fn sample_signature_requires_64_hex_chars() {
        assert!(verify_sample_signature(&"b".repeat(64)));
        assert!(!verify_sample_signature(&"b".repeat(63)));
    }

    #[test]
    fn meets_difficulty_checks_leading_zeros() {
        assert!(meets_difficulty("0000ABCD", 4));
        assert!(!meets_difficulty("000A", 4));
    }

    #[test]
    fn genesis_hash_is_deterministic() {
        let a = Block::genesis();
        let b = Block::genesis();
        assert_eq!(a.hash, b.hash);
        assert_eq!(hash_block(&a), a.hash);
    }
}
