//! `CreateTransaction`: sender, receiver, amount, optional panel_id;
//! prints the resulting txid.

use crate::{CliError, CreateTransactionArgs};
use carbon_core::ledger::LedgerState;
use carbon_core::types::{Account, Transaction};
use dialoguer::Input;
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn create_transaction(ledger: &mut LedgerState, args: CreateTransactionArgs) -> Result<(), CliError> {
    let sender = match args.sender {
        Some(v) => v,
        None => Input::new().with_prompt("Sender").interact_text()?,
    };
    let receiver = match args.receiver {
        Some(v) => v,
        None => Input::new().with_prompt("Receiver").interact_text()?,
    };
    let amount_raw = match args.amount {
        Some(v) => v,
        None => Input::new().with_prompt("Amount").interact_text()?,
    };
    let amount =
        Decimal::from_str(&amount_raw).map_err(|_| CliError::User(format!("'{amount_raw}' is not a valid decimal amount")))?;

    let tx = Transaction::new(
        Account::from(sender),
        Account::from(receiver),
        amount,
        args.panel_id,
        crate::placeholder_signature(128),
    );
    let txid = tx.txid.clone();
    ledger.submit_transaction(tx).map_err(|e| CliError::User(e.to_string()))?;
    crate::commands::print_success(&format!("transaction accepted, txid: {txid}"));
    Ok(())
}
