//! `ExecuteContract`: dispatches a named contract call and prints its
//! result. Arguments are taken positionally from the command line; each
//! one that parses as a decimal is passed as a number, otherwise as text,
//! matching the built-ins' shape of `(user_or_seller: text, token_amount:
//! number, carbon_kg: number)`.

use crate::{CliError, ExecuteContractArgs};
use carbon_core::contracts::{ContractEngine, ContractValue};
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn execute_contract(engine: &ContractEngine, args: ExecuteContractArgs) -> Result<(), CliError> {
    let name = args.name;
    let values: Vec<ContractValue> = args
        .args
        .iter()
        .map(|raw| match Decimal::from_str(raw) {
            Ok(n) => ContractValue::Number(n),
            Err(_) => ContractValue::Text(raw.clone()),
        })
        .collect();

    let result = engine.call(&name, &values).map_err(|e| CliError::User(e.to_string()))?;
    crate::commands::print_success(&format!("{name} -> {result}"));
    Ok(())
}
