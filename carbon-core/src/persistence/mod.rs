//! Persistence adapter: three independent JSON documents, chain, panel
//! registry, balances, each atomically replaceable.
//!
//! `load` rebuilds state without replaying proof-of-work (it trusts the
//! snapshot) and then requires the caller to run `validate()`; this module
//! runs that check itself and rejects the load on failure, leaving
//! whatever ledger state the caller already has untouched.

use crate::error::PersistenceError;
use crate::ledger::LedgerState;
use crate::types::{Block, PanelRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Snapshot schema version this build knows how to read. `load` rejects
/// any other value with `SnapshotCorrupt`.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// A point-in-time copy of everything a snapshot needs to persist,
/// captured from a [`LedgerState`] (or a [`LedgerHandle`](crate::ledger::LedgerHandle)
/// reply) without holding the ledger lock for the I/O itself.
#[derive(Debug, Clone)]
pub struct SnapshotData {
    pub chain: Vec<Block>,
    pub registry: HashMap<String, PanelRecord>,
    pub balances: HashMap<String, Decimal>,
    pub reference_reduction: f64,
}

impl SnapshotData {
    pub fn capture(state: &LedgerState) -> Self {
        Self {
            chain: state.chain().to_vec(),
            registry: state.registry().clone(),
            balances: state.balances().clone(),
            reference_reduction: state.reference_reduction(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ChainDocument {
    version: u32,
    reference_reduction: f64,
    blocks: Vec<Block>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryDocument {
    version: u32,
    panels: HashMap<String, PanelRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BalancesDocument {
    version: u32,
    /// Amounts as decimal strings to preserve precision:
    /// `rust_decimal::Decimal`'s default serde impl would otherwise
    /// round-trip through an f64-lossy number.
    balances: HashMap<String, String>,
}

fn chain_path(dir: &Path) -> PathBuf {
    dir.join("chain.json")
}

fn registry_path(dir: &Path) -> PathBuf {
    dir.join("panel_registry.json")
}

fn balances_path(dir: &Path) -> PathBuf {
    dir.join("balances.json")
}

/// Writes `data` as three JSON documents under `dir`, each replaced
/// atomically (write to a sibling `.tmp` file, then rename over the
/// original) so a reader never observes a half-written document.
pub fn save(dir: &Path, data: &SnapshotData) -> Result<(), PersistenceError> {
    fs::create_dir_all(dir)?;

    let chain_doc = ChainDocument {
        version: SNAPSHOT_SCHEMA_VERSION,
        reference_reduction: data.reference_reduction,
        blocks: data.chain.clone(),
    };
    let registry_doc = RegistryDocument {
        version: SNAPSHOT_SCHEMA_VERSION,
        panels: data.registry.clone(),
    };
    let balances_doc = BalancesDocument {
        version: SNAPSHOT_SCHEMA_VERSION,
        balances: data
            .balances
            .iter()
            .map(|(account, amount)| (account.clone(), amount.to_string()))
            .collect(),
    };

    write_atomic(&chain_path(dir), &chain_doc)?;
    write_atomic(&registry_path(dir), &registry_doc)?;
    write_atomic(&balances_path(dir), &balances_doc)?;

    info!(blocks = chain_doc.blocks.len(), panels = registry_doc.panels.len(), "wrote ledger snapshot");
    Ok(())
}

fn write_atomic<T: Serialize>(path: &Path, document: &T) -> Result<(), PersistenceError> {
    let tmp_path = path.with_extension("json.tmp");
    let contents = serde_json::to_string_pretty(document)
        .map_err(|e| PersistenceError::SnapshotCorrupt(format!("failed to serialize {}: {e}", path.display())))?;
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Reads the three documents back, reconstructs a [`LedgerState`] without
/// replaying proof-of-work, and validates the result. On validation
/// failure (or a schema version mismatch, or any I/O/parse error) the
/// load is rejected; the caller's current in-memory state is never
/// touched because this function never mutates anything outside `dir`.
pub fn load(dir: &Path) -> Result<LedgerState, PersistenceError> {
    let chain_doc: ChainDocument = read_json(&chain_path(dir))?;
    let registry_doc: RegistryDocument = read_json(&registry_path(dir))?;
    let balances_doc: BalancesDocument = read_json(&balances_path(dir))?;

    for (name, version) in [
        ("chain", chain_doc.version),
        ("panel registry", registry_doc.version),
        ("balances", balances_doc.version),
    ] {
        if version != SNAPSHOT_SCHEMA_VERSION {
            return Err(PersistenceError::SnapshotCorrupt(format!(
                "{name} document has unsupported schema version {version}, expected {SNAPSHOT_SCHEMA_VERSION}"
            )));
        }
    }

    let mut balances = HashMap::with_capacity(balances_doc.balances.len());
    for (account, amount) in balances_doc.balances {
        let amount = Decimal::from_str(&amount)
            .map_err(|e| PersistenceError::SnapshotCorrupt(format!("balance for {account} is not a decimal: {e}")))?;
        balances.insert(account, amount);
    }

    let state = LedgerState::from_snapshot(chain_doc.blocks, registry_doc.panels, balances, chain_doc.reference_reduction);

    if let Err(err) = state.validate() {
        warn!(%err, "rejected snapshot load: chain failed validation");
        return Err(PersistenceError::ValidationFailed(err));
    }

    Ok(state)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, PersistenceError> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| PersistenceError::SnapshotCorrupt(format!("{}: {e}", path.display())))
}
