//! Dynamic, carbon-aware difficulty.
//!
//! Difficulty here is deliberately *decreasing* in credited reduction:
//! the more carbon a block's telemetry offsets, the cheaper it is to
//! mine, which is the network's incentive mechanic.

use crate::environmental::RegionType;

pub const BASE: f64 = 4.0;
pub const SENSITIVITY: f64 = 0.8;
pub const MIN_DIFFICULTY: u32 = 2;
pub const MAX_DIFFICULTY: u32 = 8;

/// Computes the difficulty for a block with total reduction `reduction`,
/// given the ledger's current reference reduction `reference` and the
/// block's primary region type.
pub fn difficulty_for(reduction: f64, reference: f64, region: RegionType) -> u32 {
    let reduction_factor = (reduction / reference + 1.0).ln();
    let region_factor = region.compensation();
    let adjustment = BASE * (1.0 - SENSITIVITY * reduction_factor * region_factor);

    let rounded = adjustment.round();
    let clamped = rounded.clamp(MIN_DIFFICULTY as f64, MAX_DIFFICULTY as f64);
    clamped as u32
}

/// Determines the region code appearing in the most pending samples, with
/// ties broken by first-seen order within `region_codes`.
pub fn primary_region<'a>(region_codes: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: Vec<(&'a str, usize)> = Vec::new();
    for code in region_codes {
        if let Some(entry) = counts.iter_mut().find(|(c, _)| *c == code) {
            entry.1 += 1;
        } else {
            counts.push((code, 1));
        }
    }
    // `counts` is already in first-seen order; keep the first entry whose
    // count is not exceeded by anything later, so ties resolve to the
    // earliest-seen code rather than `Iterator::max_by_key`'s last-wins rule.
    let mut best: Option<(&'a str, usize)> = None;
    for (code, count) in counts {
        if best.map(|(_, best_count)| count > best_count).unwrap_or(true) {
            best = Some((code, count));
        }
    }
    best.map(|(code, _)| code)
}

/// Low-pass filter applied to the reference reduction every 10 blocks.
pub fn update_reference(current: f64, recent_mean: f64) -> f64 {
    0.7 * current + 0.3 * recent_mean
}
