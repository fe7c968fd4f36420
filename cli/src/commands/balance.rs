//! `GetBalance`: prints an `F4` decimal, four fixed fractional digits,
//! matching the ledger's fixed-point precision.

use crate::{CliError, GetBalanceArgs};
use carbon_core::ledger::LedgerState;
use dialoguer::Input;

pub fn get_balance(ledger: &LedgerState, args: GetBalanceArgs) -> Result<(), CliError> {
    let address = match args.address {
        Some(v) => v,
        None => Input::new().with_prompt("Address").interact_text()?,
    };
    let balance = ledger.balance(&address).round_dp(4);
    crate::commands::print_info(&format!("{address}: {balance:.4}"));
    Ok(())
}
