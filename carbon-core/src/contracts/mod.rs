//! Contract engine: a name → callable registry with two built-in,
//! side-effect-free contracts.

use crate::error::ContractError;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;

/// A value a contract can accept or return. Deliberately small, the core
/// never needs anything richer than these for `CarbonOffset` and
/// `CreateMarketListing`.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractValue {
    Text(String),
    Number(Decimal),
}

impl fmt::Display for ContractValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractValue::Text(s) => f.write_str(s),
            ContractValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl ContractValue {
    fn as_text(&self) -> Result<&str, ContractError> {
        match self {
            ContractValue::Text(s) => Ok(s),
            ContractValue::Number(_) => Err(ContractError::InvalidArguments(
                "expected text argument".into(),
                self.to_string(),
            )),
        }
    }

    fn as_number(&self) -> Result<Decimal, ContractError> {
        match self {
            ContractValue::Number(n) => Ok(*n),
            ContractValue::Text(_) => Err(ContractError::InvalidArguments(
                "expected numeric argument".into(),
                self.to_string(),
            )),
        }
    }
}

type Callable = Box<dyn Fn(&[ContractValue]) -> Result<ContractValue, ContractError> + Send + Sync>;

/// Dispatches calls to registered named contracts. Execution is
/// synchronous and deterministic.
pub struct ContractEngine {
    contracts: HashMap<String, Callable>,
}

impl ContractEngine {
    /// Builds an engine with the two built-in contracts already registered.
    pub fn with_builtins() -> Self {
        let mut engine = Self {
            contracts: HashMap::new(),
        };
        engine.register("CarbonOffset", Box::new(carbon_offset));
        engine.register("CreateMarketListing", Box::new(create_market_listing));
        engine
    }

    pub fn register(&mut self, name: impl Into<String>, callable: Callable) {
        self.contracts.insert(name.into(), callable);
    }

    pub fn call(&self, name: &str, args: &[ContractValue]) -> Result<ContractValue, ContractError> {
        let callable = self
            .contracts
            .get(name)
            .ok_or_else(|| ContractError::NotFound(name.to_string()))?;
        callable(args)
    }
}

impl Default for ContractEngine {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// `CarbonOffset(user, token_amount, carbon_kg)`: pure, does not debit
/// balances, since burning is a business extension.
fn carbon_offset(args: &[ContractValue]) -> Result<ContractValue, ContractError> {
    let [_user, token_amount, carbon_kg] = args else {
        return Err(ContractError::InvalidArguments(
            "CarbonOffset".into(),
            "expected (user, token_amount, carbon_kg)".into(),
        ));
    };
    let token_amount = token_amount.as_number()?;
    let carbon_kg = carbon_kg.as_number()?;

    let threshold = carbon_kg / Decimal::from(100);
    if token_amount >= threshold {
        Ok(ContractValue::Text("offset successful".into()))
    } else {
        Ok(ContractValue::Text("insufficient tokens".into()))
    }
}

/// `CreateMarketListing(seller, token_amount, carbon_kg)`: pure, no
/// persisted order book in the core.
fn create_market_listing(args: &[ContractValue]) -> Result<ContractValue, ContractError> {
    let [seller, token_amount, carbon_kg] = args else {
        return Err(ContractError::InvalidArguments(
            "CreateMarketListing".into(),
            "expected (seller, token_amount, carbon_kg)".into(),
        ));
    };
    let seller = seller.as_text()?;
    let token_amount = token_amount.as_number()?;
    let carbon_kg = carbon_kg.as_number()?;

    Ok(ContractValue::Text(format!(
        "listing created: {seller} offers {token_amount} tokens for {carbon_kg} kgCO2"
    )))
}
