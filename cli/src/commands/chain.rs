//! `ShowChainInfo`: height, tx count, cumulative reduction.

use carbon_core::ledger::LedgerState;
use carbon_core::types::BlockPayload;

pub fn show_chain_info(ledger: &LedgerState) {
    let height = ledger.chain().len() as u64 - 1;
    let tx_count: usize = ledger
        .chain()
        .iter()
        .map(|b| match &b.payload {
            BlockPayload::Transactions(txs) => txs.len(),
            BlockPayload::Samples(_) => 0,
        })
        .sum();
    let cumulative_reduction: f64 = ledger.chain().iter().map(|b| b.total_carbon_reduction).sum();

    crate::commands::print_info(&format!("height: {height}"));
    crate::commands::print_info(&format!("transactions mined: {tx_count}"));
    crate::commands::print_info(&format!("cumulative carbon reduction: {cumulative_reduction:.4} kgCO2"));
    crate::commands::print_info(&format!(
        "pending: {} samples, {} transactions",
        ledger.pending_sample_count(),
        ledger.pending_transaction_count()
    ));
}
