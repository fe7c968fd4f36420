//! Pending pool state machine: `Empty -> Accumulating -> Mining -> Sealed`.

use crate::error::MiningError;
use crate::types::{InverterSample, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Empty,
    Accumulating,
    Mining,
    Sealed,
}

/// A snapshot of the pending pool's contents, copied out before the ledger
/// lock is released for the CPU-bound nonce search.
#[derive(Debug, Clone)]
pub struct PendingSnapshot {
    pub samples: Vec<InverterSample>,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Default)]
pub struct PendingPool {
    samples: Vec<InverterSample>,
    transactions: Vec<Transaction>,
    state: PoolState,
}

impl Default for PoolState {
    fn default() -> Self {
        PoolState::Empty
    }
}

impl PendingPool {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
            transactions: Vec::new(),
            state: PoolState::Empty,
        }
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    pub fn samples(&self) -> &[InverterSample] {
        &self.samples
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Appends a sample in arrival order. Moves `Empty -> Accumulating`.
    /// Rejected while `Mining` is in progress.
    pub fn add_sample(&mut self, sample: InverterSample) -> Result<(), MiningError> {
        if self.state == PoolState::Mining {
            return Err(MiningError::StaleTip);
        }
        self.samples.push(sample);
        self.state = PoolState::Accumulating;
        Ok(())
    }

    /// Appends a transaction in arrival order. Moves `Empty ->
    /// Accumulating`. Rejected while `Mining` is in progress.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<(), MiningError> {
        if self.state == PoolState::Mining {
            return Err(MiningError::StaleTip);
        }
        self.transactions.push(tx);
        self.state = PoolState::Accumulating;
        Ok(())
    }

    /// Enters `Mining`, returning a snapshot of everything accumulated so
    /// far. Fails with `EmptyPending` if the pool has nothing to mine.
    pub fn begin_mining(&mut self) -> Result<PendingSnapshot, MiningError> {
        if self.state != PoolState::Accumulating {
            return Err(MiningError::EmptyPending);
        }
        self.state = PoolState::Mining;
        Ok(PendingSnapshot {
            samples: self.samples.clone(),
            transactions: self.transactions.clone(),
        })
    }

    /// Mining succeeded: clears the pool atomically with the chain append
    /// that the caller performs alongside this call, transitioning to
    /// `Sealed` and then immediately back to `Empty` for the next cycle.
    pub fn seal(&mut self) {
        self.samples.clear();
        self.transactions.clear();
        self.state = PoolState::Empty;
    }

    /// Mining was cancelled or lost a stale-tip race: restores
    /// `Accumulating` so the same pending set can be retried without data
    /// loss. Cancelled mines never mutate chain state.
    pub fn abort_mining(&mut self) {
        if !self.samples.is_empty() || !self.transactions.is_empty() {
            self.state = PoolState::Accumulating;
        } else {
            self.state = PoolState::Empty;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> InverterSample {
        InverterSample {
            inverter_id: "inv".into(),
            panel_id: "p1".into(),
            timestamp: Utc::now(),
            power_output_kw: 1.0,
            irradiance_w_per_m2: 800.0,
            module_temperature_c: 25.0,
            energy_generated_kwh: 5.0,
            location_tag: "上海".into(),
            signature_bytes: "a".repeat(64),
        }
    }

    #[test]
    fn empty_pool_rejects_mining() {
        let mut pool = PendingPool::new();
        assert_eq!(pool.begin_mining().unwrap_err(), MiningError::EmptyPending);
    }

    #[test]
    fn adding_a_sample_moves_to_accumulating() {
        let mut pool = PendingPool::new();
        pool.add_sample(sample()).unwrap();
        assert_eq!(pool.state(), PoolState::Accumulating);
    }

    #[test]
    fn mining_locks_out_further_accepts_until_sealed() {
        let mut pool = PendingPool::new();
        pool.add_sample(sample()).unwrap();
        pool.begin_mining().unwrap();
        assert_eq!(pool.state(), PoolState::Mining);
        assert!(pool.add_sample(sample()).is_err());
        pool.seal();
        assert_eq!(pool.state(), PoolState::Empty);
        assert!(pool.add_sample(sample()).is_ok());
    }

    #[test]
    fn abort_mining_restores_accumulating_without_losing_data() {
        let mut pool = PendingPool::new();
        pool.add_sample(sample()).unwrap();
        let snapshot = pool.begin_mining().unwrap();
        assert_eq!(snapshot.samples.len(), 1);
        pool.abort_mining();
        assert_eq!(pool.state(), PoolState::Accumulating);
        assert_eq!(pool.samples().len(), 1);
    }
}
