//! Concrete end-to-end scenarios, run against the public `LedgerState` API.

use carbon_core::ledger::LedgerState;
use carbon_core::types::{Account, InverterSample, PanelRecord, Transaction};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn oxford_pv_panel(owner: &str) -> PanelRecord {
    PanelRecord::new(
        "panel-oxford-1",
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        22.5,
        1.8,
        "Oxford PV",
        1200.0,
        25,
        0.4,
        owner,
    )
    .unwrap()
}

fn sample_for(panel_id: &str, location_tag: &str, energy_kwh: f64) -> InverterSample {
    InverterSample {
        inverter_id: "inv-1".into(),
        panel_id: panel_id.into(),
        timestamp: Utc::now(),
        power_output_kw: 1.2,
        irradiance_w_per_m2: 900.0,
        module_temperature_c: 28.0,
        energy_generated_kwh: energy_kwh,
        location_tag: location_tag.into(),
        signature_bytes: "a".repeat(64),
    }
}

fn no_cancel() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

/// Registering a panel credits the owner's balance once, around 198.60 for
/// this fixture panel.
#[test]
fn registration_credits_owner_once() {
    let mut ledger = LedgerState::new();
    let issuance = ledger.register_panel(oxford_pv_panel("alice")).unwrap();

    assert!((issuance - Decimal::from_str("198.60").unwrap()).abs() < Decimal::from_str("0.5").unwrap());
    assert_eq!(ledger.balance("alice"), issuance);
}

/// Re-registering the same panel_id fails and leaves balances alone.
#[test]
fn double_register_fails_without_double_crediting() {
    let mut ledger = LedgerState::new();
    let first_issuance = ledger.register_panel(oxford_pv_panel("alice")).unwrap();

    let err = ledger.register_panel(oxford_pv_panel("alice")).unwrap_err();
    assert!(matches!(err, carbon_core::error::RegistryError::PanelAlreadyRegistered(id) if id == "panel-oxford-1"));
    assert_eq!(ledger.balance("alice"), first_issuance);
}

/// A transfer exceeding the sender's balance is rejected and the pending
/// pool is left unchanged.
#[test]
fn transfer_with_insufficient_balance_is_rejected() {
    let mut ledger = LedgerState::new();
    ledger.register_panel(oxford_pv_panel("alice")).unwrap();
    // Drain alice's issuance down to exactly 10 via a same-amount self-top-up
    // isn't supported here, so instead size the ask far above her balance.
    let over_budget = ledger.balance("alice") + Decimal::from(1000);

    let tx = Transaction::new(Account::User("alice".into()), Account::User("bob".into()), over_budget, None, "b".repeat(128));
    let err = ledger.submit_transaction(tx).unwrap_err();

    assert!(matches!(err, carbon_core::error::TransactionError::InsufficientBalance { .. }));
    assert_eq!(ledger.pending_transaction_count(), 0);
}

/// A second transfer that would overdraw against a sender's already-pending
/// outflow is rejected even though it is affordable against the committed
/// balance alone.
#[test]
fn second_transfer_cannot_overdraw_against_pending_outflow() {
    let mut ledger = LedgerState::new();
    ledger.register_panel(oxford_pv_panel("alice")).unwrap();
    let balance = ledger.balance("alice");

    let first = Transaction::new(Account::User("alice".into()), Account::User("bob".into()), balance, None, "b".repeat(128));
    ledger.submit_transaction(first).unwrap();

    let second = Transaction::new(Account::User("alice".into()), Account::User("carol".into()), balance, None, "c".repeat(128));
    let err = ledger.submit_transaction(second).unwrap_err();
    assert!(matches!(err, carbon_core::error::TransactionError::InsufficientBalance { .. }));
    assert_eq!(ledger.pending_transaction_count(), 1);
}

/// A sample set whose credited reduction exceeds the reference reduction
/// mines at the low end of the difficulty range.
#[test]
fn mining_high_reduction_samples_lowers_difficulty() {
    let mut ledger = LedgerState::new();
    ledger.register_panel(oxford_pv_panel("alice")).unwrap();

    // A large energy reading in a TypeII region (CN-XJ is not in the
    // substring table, so route through a real CN-EC/CN-SC/CN-HB/CN-XZ
    // location instead; the exact region only changes the compensation
    // multiplier, not the qualitative direction of this scenario).
    for _ in 0..5 {
        ledger.submit_sample(sample_for("panel-oxford-1", "上海市", 400.0)).unwrap();
    }

    let snapshot = ledger.begin_mining().unwrap();
    let report = ledger.mine("miner-1", snapshot, &no_cancel()).unwrap();

    assert!(report.total_carbon_reduction > ledger.reference_reduction());
    assert!(report.difficulty <= 4);
    assert!(carbon_core::consensus::validate_proof_of_work(&ledger.chain()[1]));
}

/// Small reduction relative to the reference keeps difficulty near `BASE`.
#[test]
fn mining_low_reduction_samples_keeps_difficulty_near_base() {
    let mut ledger = LedgerState::new();
    ledger.register_panel(oxford_pv_panel("alice")).unwrap();
    ledger.submit_sample(sample_for("panel-oxford-1", "untracked location", 1.0)).unwrap();

    let snapshot = ledger.begin_mining().unwrap();
    let report = ledger.mine("miner-1", snapshot, &no_cancel()).unwrap();

    assert!(report.total_carbon_reduction < ledger.reference_reduction());
    assert!(report.difficulty >= 3);
}

/// After the 10th block, the reference reduction resmooths by the low-pass
/// filter over the last (up to) 10 blocks' total reduction.
#[test]
fn reference_reduction_resmooths_after_block_ten() {
    let mut ledger = LedgerState::new();
    assert_eq!(ledger.reference_reduction(), 1000.0);

    for i in 0..10 {
        let tx = Transaction::new(Account::System, Account::User(format!("user-{i}")), Decimal::ONE, None, "c".repeat(128));
        ledger.submit_transaction(tx).unwrap();
        let snapshot = ledger.begin_mining().unwrap();
        ledger.mine("miner-1", snapshot, &no_cancel()).unwrap();
    }

    // All 10 blocks are economic (Transactions payload), so their
    // total_carbon_reduction is 0.0; the resmoothed reference is
    // 0.7*1000 + 0.3*0 = 700.
    assert!((ledger.reference_reduction() - 700.0).abs() < 1e-9);
}

/// The mining reward at a given height follows the halving schedule;
/// checked here by crediting the first mined block's reward to the miner.
#[test]
fn first_block_reward_matches_height_one_schedule() {
    let mut ledger = LedgerState::new();
    let tx = Transaction::new(Account::System, Account::User("bob".into()), Decimal::ONE, None, "d".repeat(128));
    ledger.submit_transaction(tx).unwrap();
    let snapshot = ledger.begin_mining().unwrap();
    let report = ledger.mine("miner-1", snapshot, &no_cancel()).unwrap();

    assert_eq!(report.reward, carbon_core::issuance::reward_at_height(1));
    assert_eq!(ledger.balance("miner-1"), report.reward);
}
