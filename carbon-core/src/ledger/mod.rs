//! Ledger state machine: chain, pending pool, balances, and panel
//! registry, plus the single-writer actor that owns it.

pub mod actor;
pub mod pool;
pub mod state;

pub use actor::{ChainInfo, LedgerGone, LedgerHandle};
pub use pool::{PendingPool, PendingSnapshot, PoolState};
pub use state::{LedgerState, MinedBlockReport, MiningWorkspace};
