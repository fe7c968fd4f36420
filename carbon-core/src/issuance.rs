//! Issuance and mining reward rules.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Initial token issuance at panel registration. The log-scaling damps
/// high-value outliers; returned with 4 fractional digits, the ledger's
/// fixed decimal precision.
pub fn registration_issuance(lifetime_reduction_kgco2: f64, efficiency_pct: f64, lifetime_years: u32) -> Decimal {
    let eff_factor = (efficiency_pct / 20.0).powf(1.5);
    let life_factor = 1.0 + (lifetime_years as f64).ln() / 10.0;
    let raw = lifetime_reduction_kgco2 * eff_factor * life_factor / 100.0;
    let issuance = (raw + 1.0).log10() * 100.0;

    Decimal::from_f64(issuance)
        .unwrap_or(Decimal::ZERO)
        .round_dp(4)
}

/// Halvings are capped at 64.
const MAX_HALVINGS: u32 = 64;
/// Height interval between halvings.
const HALVING_INTERVAL: u64 = 210_000;
/// Base block reward before any halving.
const BASE_REWARD: f64 = 50.0;

/// Mining reward at block height `h`: `50 / 2^min(h/210000, 64)`, rounded
/// to 4 fractional digits.
pub fn reward_at_height(height: u64) -> Decimal {
    let halvings = (height / HALVING_INTERVAL).min(MAX_HALVINGS as u64) as u32;
    let reward = BASE_REWARD / 2f64.powi(halvings as i32);
    Decimal::from_f64(reward).unwrap_or(Decimal::ZERO).round_dp(4)
}
