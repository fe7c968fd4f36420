//! Ledger state machine: chain, pending pool, balances, panel registry,
//! genesis, and validation.

use super::pool::{PendingPool, PendingSnapshot};
use crate::consensus::{difficulty_for, primary_region, search_nonce, update_reference, validate_proof_of_work};
use crate::crypto::{hash_block, verify_sample_signature, verify_transaction_signature};
use crate::environmental::{lifetime_reduction, resolve_region_code, sample_reduction, GridFactorTable, RegionType};
use crate::error::{ChainError, MiningError, RegistryError, TransactionError};
use crate::issuance::{registration_issuance, reward_at_height};
use crate::types::{Account, Block, BlockPayload, InverterSample, PanelRecord, Transaction};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Number of recent blocks averaged when smoothing the reference reduction.
const REFERENCE_SMOOTHING_WINDOW: usize = 10;

/// Everything the ledger owns: chain, pending pool, balances, panel
/// registry, grid factor table, reference reduction.
pub struct LedgerState {
    chain: Vec<Block>,
    pending: PendingPool,
    balances: HashMap<String, Decimal>,
    registry: HashMap<String, PanelRecord>,
    grid: GridFactorTable,
    reference_reduction: f64,
}

/// An unmined block plus the chain tip hash observed when it was built,
/// carried across the `spawn_blocking` nonce search so the ledger actor can
/// commit it without re-deriving difficulty or payload.
#[derive(Debug, Clone)]
pub struct MiningWorkspace {
    pub block: Block,
    expected_tip_hash: String,
}

/// Outcome of a successful `mine()` call.
#[derive(Debug, Clone)]
pub struct MinedBlockReport {
    pub block_index: u64,
    pub block_hash: String,
    pub difficulty: u32,
    pub total_carbon_reduction: f64,
    pub reward: Decimal,
}

impl LedgerState {
    /// Builds a fresh ledger with only the genesis block.
    pub fn new() -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending: PendingPool::new(),
            balances: HashMap::new(),
            registry: HashMap::new(),
            grid: GridFactorTable::new(),
            reference_reduction: 1000.0,
        }
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn balance(&self, account: &str) -> Decimal {
        self.balances.get(account).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn panel(&self, panel_id: &str) -> Option<&PanelRecord> {
        self.registry.get(panel_id)
    }

    pub fn pending_sample_count(&self) -> usize {
        self.pending.samples().len()
    }

    pub fn pending_transaction_count(&self) -> usize {
        self.pending.transactions().len()
    }

    pub fn reference_reduction(&self) -> f64 {
        self.reference_reduction
    }

    /// Registers a new panel and credits its owner's balance exactly once.
    /// Registration credits the owner directly: it never also queues a
    /// pending issuance transaction, which would double-credit at the next
    /// `mine()`.
    pub fn register_panel(&mut self, panel: PanelRecord) -> Result<Decimal, RegistryError> {
        if self.registry.contains_key(&panel.panel_id) {
            return Err(RegistryError::PanelAlreadyRegistered(panel.panel_id));
        }

        let reduction = lifetime_reduction(&panel);
        let issuance = registration_issuance(
            reduction.lifetime_reduction_kgco2,
            panel.nominal_efficiency_pct,
            panel.lifetime_years,
        );

        let owner = panel.owner.clone();
        let panel_id = panel.panel_id.clone();
        self.registry.insert(panel_id, panel);
        self.credit(&owner, issuance);

        Ok(issuance)
    }

    /// Validates and accepts a transaction into the pending pool.
    ///
    /// A sender's balance is checked against the committed balance minus
    /// whatever that same sender already has queued in the pending pool, so
    /// a second transaction cannot be accepted against funds the first one
    /// has already reserved. Without this, two individually affordable
    /// transfers from the same sender could both be accepted and then both
    /// applied at mining time, driving the balance negative.
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<(), TransactionError> {
        if tx.amount <= Decimal::ZERO {
            return Err(TransactionError::Invalid("amount must be > 0".into()));
        }
        if !verify_transaction_signature(&tx.signature) {
            return Err(TransactionError::Invalid("signature predicate failed".into()));
        }
        if let Some(panel_id) = &tx.panel_id {
            if !self.registry.contains_key(panel_id) {
                return Err(TransactionError::Invalid(format!(
                    "panel_id {panel_id} is not registered"
                )));
            }
        }

        if let Account::User(sender) = &tx.sender {
            let available = self.available_balance(sender);
            if available < tx.amount {
                return Err(TransactionError::InsufficientBalance {
                    sender: sender.clone(),
                    balance: available.to_string(),
                    amount: tx.amount.to_string(),
                });
            }
        }

        self.pending
            .add_transaction(tx)
            .map_err(|_| TransactionError::Invalid("pending pool is mid-mine".into()))
    }

    /// Committed balance for `sender` minus outflows already queued in the
    /// pending pool from that same sender, the amount actually available to
    /// back a new transaction.
    fn available_balance(&self, sender: &str) -> Decimal {
        let reserved: Decimal = self
            .pending
            .transactions()
            .iter()
            .filter(|pending| matches!(&pending.sender, Account::User(s) if s == sender))
            .map(|pending| pending.amount)
            .sum();
        self.balance(sender) - reserved
    }

    /// Validates and accepts a telemetry sample into the pending pool.
    /// Crediting eligibility (panel/region lookup) is deferred to mining
    /// time.
    pub fn submit_sample(&mut self, sample: InverterSample) -> Result<(), TransactionError> {
        if sample.energy_generated_kwh < 0.0 {
            return Err(TransactionError::Invalid("energy_generated_kwh must be >= 0".into()));
        }
        if !verify_sample_signature(&sample.signature_bytes) {
            return Err(TransactionError::Invalid("signature predicate failed".into()));
        }

        self.pending
            .add_sample(sample)
            .map_err(|_| TransactionError::Invalid("pending pool is mid-mine".into()))
    }

    /// Copies the pending pool out for a mining workspace without holding
    /// the ledger lock during the nonce search.
    pub fn begin_mining(&mut self) -> Result<PendingSnapshot, MiningError> {
        self.pending.begin_mining()
    }

    pub fn abort_mining(&mut self) {
        self.pending.abort_mining();
    }

    /// Total effective reduction credited to a pending sample set: samples
    /// whose panel or region lookup fails are skipped for crediting. The
    /// total is invariant under reordering of the sample set.
    pub fn total_reduction(&self, samples: &[InverterSample]) -> f64 {
        samples
            .iter()
            .filter_map(|sample| self.credited_reduction(sample))
            .sum()
    }

    fn credited_reduction(&self, sample: &InverterSample) -> Option<f64> {
        let panel = self.registry.get(&sample.panel_id)?;
        let region_code = resolve_region_code(&sample.location_tag);
        let grid_factor = self.grid.factor(region_code)?;
        let carbon_intensity = lifetime_reduction(panel).carbon_intensity;
        Some(sample_reduction(sample, panel, carbon_intensity, grid_factor).effective_reduction_kgco2)
    }

    /// Determines the primary region among a pending sample set: the region
    /// code appearing in the most samples, ties broken by first-seen order.
    pub fn primary_region_type(&self, samples: &[InverterSample]) -> RegionType {
        let codes: Vec<&str> = samples
            .iter()
            .map(|s| resolve_region_code(&s.location_tag))
            .collect();
        match primary_region(codes.into_iter()) {
            Some(code) => RegionType::from_code(code),
            None => RegionType::TypeIII,
        }
    }

    /// Builds the unmined block (difficulty derived, payload attached,
    /// nonce/hash not yet searched) and remembers the chain tip the caller
    /// observed, so the CPU-bound nonce search can run without holding the
    /// ledger lock. Pairs with [`Self::commit_mined_block`].
    pub fn prepare_mining(
        &mut self,
        miner: &str,
        snapshot: PendingSnapshot,
    ) -> Result<MiningWorkspace, MiningError> {
        if snapshot.samples.is_empty() && snapshot.transactions.is_empty() {
            self.abort_mining();
            return Err(MiningError::EmptyPending);
        }

        let tip = self.chain.last().expect("chain always has a genesis block").clone();

        let (payload, total_reduction, region) = if !snapshot.samples.is_empty() {
            let total = self.total_reduction(&snapshot.samples);
            let region = self.primary_region_type(&snapshot.samples);
            (BlockPayload::Samples(snapshot.samples), total, region)
        } else {
            // Economic blocks carry no credited reduction: lifetime
            // reduction is credited exactly once, at registration, never
            // replayed per-transaction.
            (BlockPayload::Transactions(snapshot.transactions), 0.0, RegionType::TypeIII)
        };

        let difficulty = difficulty_for(total_reduction, self.reference_reduction, region);

        let block = Block {
            index: tip.index + 1,
            timestamp: chrono::Utc::now(),
            previous_hash: tip.hash.clone(),
            hash: String::new(),
            nonce: 0,
            miner: miner.to_string(),
            total_carbon_reduction: total_reduction,
            difficulty,
            payload,
        };

        Ok(MiningWorkspace {
            block,
            expected_tip_hash: tip.hash,
        })
    }

    /// Commits a workspace whose nonce search already succeeded: re-checks
    /// the chain tip has not moved, applies the block's transactions,
    /// clears pending, credits the mining reward, appends the block, and
    /// re-smooths the reference reduction every 10 blocks.
    ///
    /// Fails with `StaleTip`, without mutating chain state, if another
    /// block was committed while this one was being searched.
    pub fn commit_mined_block(&mut self, workspace: MiningWorkspace) -> Result<MinedBlockReport, MiningError> {
        let MiningWorkspace { block, expected_tip_hash } = workspace;

        if self.chain.last().expect("chain always has a genesis block").hash != expected_tip_hash {
            self.abort_mining();
            return Err(MiningError::StaleTip);
        }

        if let BlockPayload::Transactions(txs) = &block.payload {
            for tx in txs {
                if let Account::User(sender) = &tx.sender {
                    self.debit(sender, tx.amount);
                }
                self.credit(tx.receiver.as_str(), tx.amount);
            }
        }

        let reward = reward_at_height(block.index);
        self.credit(&block.miner, reward);

        let index = block.index;
        let hash = block.hash.clone();
        let difficulty = block.difficulty;
        let total_reduction = block.total_carbon_reduction;
        self.chain.push(block);
        self.pending.seal();

        if index > 0 && index % 10 == 0 {
            self.resmooth_reference();
        }

        Ok(MinedBlockReport {
            block_index: index,
            block_hash: hash,
            difficulty,
            total_carbon_reduction: total_reduction,
            reward,
        })
    }

    /// Runs the full mine cycle in one call: derive difficulty, search a
    /// nonce on the caller's thread, and commit. Convenient for tests and
    /// synchronous callers; [`LedgerActor`](super::actor::LedgerActor)
    /// instead splits [`Self::prepare_mining`] and [`Self::commit_mined_block`]
    /// around a `spawn_blocking` nonce search so the ledger lock is never
    /// held across it.
    pub fn mine(
        &mut self,
        miner: &str,
        snapshot: PendingSnapshot,
        cancel: &Arc<AtomicBool>,
    ) -> Result<MinedBlockReport, MiningError> {
        let mut workspace = self.prepare_mining(miner, snapshot)?;

        if !search_nonce(&mut workspace.block, cancel) {
            self.abort_mining();
            return Err(MiningError::Cancelled);
        }

        self.commit_mined_block(workspace)
    }

    fn resmooth_reference(&mut self) {
        let window = REFERENCE_SMOOTHING_WINDOW.min(self.chain.len());
        let recent = &self.chain[self.chain.len() - window..];
        let mean: f64 = recent.iter().map(|b| b.total_carbon_reduction).sum::<f64>() / recent.len() as f64;
        self.reference_reduction = update_reference(self.reference_reduction, mean);
    }

    fn credit(&mut self, account: &str, amount: Decimal) {
        *self.balances.entry(account.to_string()).or_insert(Decimal::ZERO) += amount;
    }

    fn debit(&mut self, account: &str, amount: Decimal) {
        *self.balances.entry(account.to_string()).or_insert(Decimal::ZERO) -= amount;
    }

    /// Full chain replay: hash linkage, hash recomputation, PoW, and
    /// per-item signature predicate for every block. Returns on the first
    /// failure.
    pub fn validate(&self) -> Result<(), ChainError> {
        for (i, block) in self.chain.iter().enumerate() {
            if i == 0 {
                continue;
            }
            let previous = &self.chain[i - 1];
            if block.previous_hash != previous.hash {
                return Err(ChainError::Invalid {
                    index: i as u64,
                    reason: "previous_hash does not match prior block's hash".into(),
                });
            }
            if hash_block(block) != block.hash {
                return Err(ChainError::Invalid {
                    index: i as u64,
                    reason: "stored hash does not match recomputed hash".into(),
                });
            }
            if !validate_proof_of_work(block) {
                return Err(ChainError::Invalid {
                    index: i as u64,
                    reason: "hash does not meet the block's stated difficulty".into(),
                });
            }

            let signatures_ok = match &block.payload {
                BlockPayload::Samples(samples) => samples.iter().all(|s| verify_sample_signature(&s.signature_bytes)),
                BlockPayload::Transactions(txs) => txs.iter().all(|t| verify_transaction_signature(&t.signature)),
            };
            if !signatures_ok {
                return Err(ChainError::Invalid {
                    index: i as u64,
                    reason: "a payload item failed the signature predicate".into(),
                });
            }
        }
        Ok(())
    }

    /// Rebuilds ledger state from persisted components without replaying
    /// PoW, trusting the snapshot. Callers must still run `validate()`
    /// afterwards and reject the load if it fails.
    pub fn from_snapshot(
        chain: Vec<Block>,
        registry: HashMap<String, PanelRecord>,
        balances: HashMap<String, Decimal>,
        reference_reduction: f64,
    ) -> Self {
        Self {
            chain,
            pending: PendingPool::new(),
            balances,
            registry,
            grid: GridFactorTable::new(),
            reference_reduction,
        }
    }

    pub fn registry(&self) -> &HashMap<String, PanelRecord> {
        &self.registry
    }

    pub fn balances(&self) -> &HashMap<String, Decimal> {
        &self.balances
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new()
    }
}
