//! Data model shared across the carbon engine, consensus, and ledger
//! modules.

pub mod account;
pub mod block;
pub mod panel;
pub mod sample;
pub mod transaction;

pub use account::Account;
pub use block::{Block, BlockPayload};
pub use panel::{PanelFieldError, PanelRecord};
pub use sample::InverterSample;
pub use transaction::Transaction;
