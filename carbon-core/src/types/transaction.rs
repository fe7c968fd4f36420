use super::account::Account;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A ledger transfer, owned by the pending pool and then by the block it is
/// mined into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub txid: String,
    pub sender: Account,
    pub receiver: Account,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub panel_id: Option<String>,
    pub signature: String,
}

impl Transaction {
    /// Builds a transaction with a freshly derived `txid` (SHA-256 of a
    /// random UUID).
    pub fn new(
        sender: Account,
        receiver: Account,
        amount: Decimal,
        panel_id: Option<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            txid: Self::generate_txid(),
            sender,
            receiver,
            amount,
            timestamp: Utc::now(),
            panel_id,
            signature: signature.into(),
        }
    }

    pub fn generate_txid() -> String {
        let id = uuid::Uuid::new_v4();
        let digest = Sha256::digest(id.as_bytes());
        hex::encode_upper(digest)
    }

    /// Identifier baked into the block's payload digest.
    pub fn payload_digest_piece(&self) -> &str {
        &self.txid
    }
}
