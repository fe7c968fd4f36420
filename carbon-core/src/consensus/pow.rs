//! Nonce search and proof-of-work validation.

use crate::crypto::{hash_block, meets_difficulty};
use crate::types::Block;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How often the search loop polls the cancel flag.
const CANCEL_POLL_INTERVAL: u64 = 1 << 16;

/// Searches for the first nonce, starting at 1, whose resulting block hash
/// has at least `block.difficulty` leading zero hex characters. Mutates
/// `block.nonce` and `block.hash` in place on success.
///
/// Returns `false` if `cancel` was observed set before a solution was
/// found; the caller must treat the block as not mined.
pub fn search_nonce(block: &mut Block, cancel: &Arc<AtomicBool>) -> bool {
    let mut nonce: u64 = 1;
    loop {
        if nonce % CANCEL_POLL_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            return false;
        }

        block.nonce = nonce;
        let hash = hash_block(block);
        if meets_difficulty(&hash, block.difficulty) {
            block.hash = hash;
            return true;
        }

        nonce += 1;
    }
}

/// Re-derives a block's hash and checks it meets its own stated difficulty.
pub fn validate_proof_of_work(block: &Block) -> bool {
    let recomputed = hash_block(block);
    recomputed == block.hash && meets_difficulty(&block.hash, block.difficulty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockPayload;
    use chrono::Utc;

    fn unmined_block(difficulty: u32) -> Block {
        Block {
            index: 1,
            timestamp: Utc::now(),
            previous_hash: "0".repeat(64),
            hash: String::new(),
            nonce: 0,
            miner: "alice".into(),
            total_carbon_reduction: 0.0,
            difficulty,
            payload: BlockPayload::Transactions(Vec::new()),
        }
    }

    #[test]
    fn search_nonce_finds_a_hash_meeting_difficulty() {
        let mut block = unmined_block(2);
        let cancel = Arc::new(AtomicBool::new(false));
        assert!(search_nonce(&mut block, &cancel));
        assert!(validate_proof_of_work(&block));
    }

    #[test]
    fn search_nonce_respects_cancellation() {
        // At difficulty 8 the odds of a solution inside one poll window
        // (2^16 nonces) are vanishingly small, so a pre-set cancel flag is
        // expected to stop the search at the first poll.
        let mut block = unmined_block(8);
        let cancel = Arc::new(AtomicBool::new(true));
        assert!(!search_nonce(&mut block, &cancel));
    }
}
