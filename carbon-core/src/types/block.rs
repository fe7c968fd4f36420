use super::sample::InverterSample;
use super::transaction::Transaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two payload shapes a block can carry: a carbon-aware block full of
/// telemetry, or an economic block full of transfers. One `Block` type
/// dispatches on this tag instead of keeping two near-identical chain
/// variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "items")]
pub enum BlockPayload {
    Samples(Vec<InverterSample>),
    Transactions(Vec<Transaction>),
}

impl BlockPayload {
    pub fn is_empty(&self) -> bool {
        match self {
            BlockPayload::Samples(v) => v.is_empty(),
            BlockPayload::Transactions(v) => v.is_empty(),
        }
    }

    /// Per-item identifiers concatenated for the hash digest.
    pub fn digest_pieces(&self) -> String {
        match self {
            BlockPayload::Samples(items) => items
                .iter()
                .map(|s| s.payload_digest_piece())
                .collect::<Vec<_>>()
                .join(""),
            BlockPayload::Transactions(items) => items
                .iter()
                .map(|t| t.payload_digest_piece().to_string())
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub previous_hash: String,
    pub hash: String,
    pub nonce: u64,
    pub miner: String,
    pub total_carbon_reduction: f64,
    pub difficulty: u32,
    pub payload: BlockPayload,
}

impl Block {
    /// Builds the genesis block: index 0, fixed timestamp,
    /// `previous_hash = "0"`, difficulty 4, miner `"system"`, empty payload.
    pub fn genesis() -> Self {
        let timestamp = DateTime::parse_from_rfc3339("2023-01-01T00:00:00Z")
            .expect("genesis timestamp literal is valid RFC3339")
            .with_timezone(&Utc);

        let mut block = Self {
            index: 0,
            timestamp,
            previous_hash: "0".to_string(),
            hash: String::new(),
            nonce: 0,
            miner: "system".to_string(),
            total_carbon_reduction: 0.0,
            difficulty: 4,
            payload: BlockPayload::Transactions(Vec::new()),
        };
        block.hash = crate::crypto::hash_block(&block);
        block
    }
}
