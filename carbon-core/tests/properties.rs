//! Quantified invariants, proptest-driven where a generator is natural.

use carbon_core::consensus::validate_proof_of_work;
use carbon_core::ledger::LedgerState;
use carbon_core::types::{Account, BlockPayload, InverterSample, PanelRecord, Transaction};
use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn no_cancel() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

fn panel(id: &str, owner: &str) -> PanelRecord {
    PanelRecord::new(id, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 20.0, 2.0, "Test Manufacturing", 500.0, 20, 0.3, owner).unwrap()
}

fn sample(panel_id: &str, energy_kwh: f64, location_tag: &str) -> InverterSample {
    InverterSample {
        inverter_id: "inv-1".into(),
        panel_id: panel_id.into(),
        timestamp: Utc::now(),
        power_output_kw: 1.0,
        irradiance_w_per_m2: 850.0,
        module_temperature_c: 30.0,
        energy_generated_kwh: energy_kwh,
        location_tag: location_tag.into(),
        signature_bytes: "f".repeat(64),
    }
}

/// Recomputing a mined block's hash matches the stored hash, and that hash
/// has at least `difficulty` leading zero hex characters.
#[test]
fn mined_blocks_satisfy_hash_and_pow_invariants() {
    let mut ledger = LedgerState::new();
    ledger.register_panel(panel("p1", "alice")).unwrap();
    ledger.submit_sample(sample("p1", 50.0, "广东省")).unwrap();

    let snapshot = ledger.begin_mining().unwrap();
    ledger.mine("miner-1", snapshot, &no_cancel()).unwrap();

    for block in &ledger.chain()[1..] {
        assert!(validate_proof_of_work(block));
    }
}

/// Across the whole chain, every credit to a non-system account is matched
/// by either a system-sourced issuance/reward or a debit from another user
/// account: `"system"` never has its own balance reduced, by construction
/// (`debit` is only ever called for `Account::User`).
#[test]
fn credits_and_debits_balance_against_system_sourced_issuance() {
    let mut ledger = LedgerState::new();
    let issuance = ledger.register_panel(panel("p1", "alice")).unwrap();

    let tx = Transaction::new(Account::User("alice".into()), Account::User("bob".into()), Decimal::from(5), None, "a".repeat(128));
    ledger.submit_transaction(tx).unwrap();
    let snapshot = ledger.begin_mining().unwrap();
    let report = ledger.mine("miner-1", snapshot, &no_cancel()).unwrap();

    let total_balances: Decimal = ledger.balances().values().copied().sum();
    let total_system_sourced = issuance + report.reward;
    assert_eq!(total_balances, total_system_sourced);
}

/// No balance ever goes negative across a sequence of registrations,
/// transfers, and mines, including when a sender submits two transactions
/// that are each individually affordable against the committed balance but
/// not together.
#[test]
fn no_balance_goes_negative() {
    let mut ledger = LedgerState::new();
    ledger.register_panel(panel("p1", "alice")).unwrap();

    let alice_balance = ledger.balance("alice");
    let overdraft = Transaction::new(Account::User("alice".into()), Account::User("bob".into()), alice_balance + Decimal::ONE, None, "b".repeat(128));
    assert!(ledger.submit_transaction(overdraft).is_err());

    let first = Transaction::new(Account::User("alice".into()), Account::User("bob".into()), alice_balance, None, "c".repeat(128));
    ledger.submit_transaction(first).unwrap();

    let second = Transaction::new(Account::User("alice".into()), Account::User("carol".into()), alice_balance, None, "e".repeat(128));
    assert!(ledger.submit_transaction(second).is_err());

    let snapshot = ledger.begin_mining().unwrap();
    ledger.mine("miner-1", snapshot, &no_cancel()).unwrap();

    for balance in ledger.balances().values() {
        assert!(*balance >= Decimal::ZERO);
    }
}

/// A captured snapshot round-trips bit-exactly through save/load.
#[test]
fn snapshot_round_trips() {
    let mut ledger = LedgerState::new();
    ledger.register_panel(panel("p1", "alice")).unwrap();
    let tx = Transaction::new(Account::User("alice".into()), Account::User("bob".into()), Decimal::from(2), None, "d".repeat(128));
    ledger.submit_transaction(tx).unwrap();
    let snapshot = ledger.begin_mining().unwrap();
    ledger.mine("miner-1", snapshot, &no_cancel()).unwrap();

    let data = carbon_core::persistence::SnapshotData::capture(&ledger);
    let dir = tempfile::tempdir().unwrap();
    carbon_core::persistence::save(dir.path(), &data).unwrap();
    let restored = carbon_core::persistence::load(dir.path()).unwrap();

    assert_eq!(restored.chain(), ledger.chain());
    assert_eq!(restored.balances(), ledger.balances());
    assert_eq!(restored.registry(), ledger.registry());
}

/// Mining is idempotent under cancel-and-retry when the pending state is
/// unchanged: a cancelled mine restores `Accumulating` and leaves the chain
/// untouched, so retrying with the same pending set succeeds.
///
/// Difficulty is forced to the maximum so the cancel flag (pre-set before
/// the search starts) is observed at the first poll, the way
/// `search_nonce_respects_cancellation` in `consensus::pow` does; deriving
/// difficulty from reduction here could solve before the first poll and
/// make the test flaky.
#[test]
fn mining_is_idempotent_under_cancel_and_retry() {
    let mut ledger = LedgerState::new();
    ledger.register_panel(panel("p1", "alice")).unwrap();
    ledger.submit_sample(sample("p1", 20.0, "untracked")).unwrap();

    let snapshot = ledger.begin_mining().unwrap();
    let mut workspace = ledger.prepare_mining("miner-1", snapshot).unwrap();
    workspace.block.difficulty = 8;

    let cancel = Arc::new(AtomicBool::new(true));
    assert!(!carbon_core::consensus::search_nonce(&mut workspace.block, &cancel));
    ledger.abort_mining();
    assert_eq!(ledger.chain().len(), 1);

    let snapshot = ledger.begin_mining().unwrap();
    let report = ledger.mine("miner-1", snapshot, &no_cancel()).unwrap();
    assert_eq!(report.block_index, 1);
    assert_eq!(ledger.chain().len(), 2);
}

proptest! {
    /// `total_reduction` over a pending sample set does not depend on the
    /// order the samples were submitted in.
    #[test]
    fn total_reduction_is_invariant_under_reordering(
        energies in prop::collection::vec(1.0f64..500.0, 1..8),
        seed in 0u64..4,
    ) {
        let mut ledger = LedgerState::new();
        ledger.register_panel(panel("p1", "alice")).unwrap();

        let locations = ["上海市", "广东省", "西藏自治区", "untracked"];
        let samples: Vec<InverterSample> = energies
            .iter()
            .enumerate()
            .map(|(i, &energy)| sample("p1", energy, locations[(i as u64 + seed) as usize % locations.len()]))
            .collect();

        let forward_total = ledger.total_reduction(&samples);
        let mut reversed = samples.clone();
        reversed.reverse();
        let reversed_total = ledger.total_reduction(&reversed);

        prop_assert!((forward_total - reversed_total).abs() < 1e-6);
    }

    /// For arbitrary transfer amounts within the sender's balance, total
    /// balances after mining equal total system-sourced issuance and
    /// rewards.
    #[test]
    fn balances_sum_to_system_sourced_amounts_for_arbitrary_transfers(
        transfer_units in 0u32..500,
    ) {
        let mut ledger = LedgerState::new();
        let issuance = ledger.register_panel(panel("p1", "alice")).unwrap();
        let transfer = Decimal::from(transfer_units) * Decimal::new(1, 2);

        if transfer > Decimal::ZERO && transfer <= issuance {
            let tx = Transaction::new(Account::User("alice".into()), Account::User("bob".into()), transfer, None, "e".repeat(128));
            ledger.submit_transaction(tx).unwrap();
        } else {
            let tx = Transaction::new(Account::System, Account::User("bob".into()), Decimal::ONE, None, "e".repeat(128));
            ledger.submit_transaction(tx).unwrap();
        }

        let snapshot = ledger.begin_mining().unwrap();
        let report = ledger.mine("miner-1", snapshot, &no_cancel()).unwrap();

        let total_balances: Decimal = ledger.balances().values().copied().sum();
        let extra_issuance = match &ledger.chain().last().unwrap().payload {
            BlockPayload::Transactions(txs) => txs.iter().filter(|t| t.sender.is_system()).map(|t| t.amount).sum::<Decimal>(),
            BlockPayload::Samples(_) => Decimal::ZERO,
        };
        prop_assert_eq!(total_balances, issuance + report.reward + extra_issuance);
    }
}
