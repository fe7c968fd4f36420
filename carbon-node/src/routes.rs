//! REST adapter: a thin wrapper over a [`LedgerHandle`]. `GET /health` and
//! `GET /chain` are ambient additions alongside the domain endpoints, in
//! keeping with the habit of always exposing liveness/introspection routes
//! next to the domain ones.

use crate::error::ApiError;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use carbon_core::contracts::{ContractEngine, ContractValue};
use carbon_core::ledger::LedgerHandle;
use carbon_core::types::{Account, PanelRecord, Transaction};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerHandle,
    pub contracts: Arc<ContractEngine>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chain", get(chain_info))
        .route("/balance/:address", get(balance))
        .route("/panels", post(register_panel))
        .route("/transactions", post(create_transaction))
        .route("/contracts/:name", post(execute_contract))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
struct ChainInfoResponse {
    height: u64,
    pending_sample_count: usize,
    pending_transaction_count: usize,
    reference_reduction: f64,
    cumulative_reduction: f64,
}

async fn chain_info(State(state): State<AppState>) -> Result<Json<ChainInfoResponse>, ApiError> {
    let info = state.ledger.chain_info().await?;
    Ok(Json(ChainInfoResponse {
        height: info.height,
        pending_sample_count: info.pending_sample_count,
        pending_transaction_count: info.pending_transaction_count,
        reference_reduction: info.reference_reduction,
        cumulative_reduction: info.cumulative_reduction,
    }))
}

#[derive(Debug, Serialize)]
struct BalanceResponse {
    address: String,
    balance: String,
}

async fn balance(State(state): State<AppState>, Path(address): Path<String>) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.ledger.balance(address.clone()).await?;
    Ok(Json(BalanceResponse {
        address,
        balance: balance.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
struct RegisterPanelRequest {
    panel_id: String,
    production_date: NaiveDate,
    nominal_efficiency_pct: f64,
    size_m2: f64,
    manufacturer: String,
    manufacturing_footprint_kgco2: f64,
    lifetime_years: u32,
    carbon_reduction_factor: f64,
    owner: String,
}

#[derive(Debug, Serialize)]
struct RegisterPanelResponse {
    panel_id: String,
    issuance: String,
}

async fn register_panel(
    State(state): State<AppState>,
    Json(req): Json<RegisterPanelRequest>,
) -> Result<Json<RegisterPanelResponse>, ApiError> {
    let panel = PanelRecord::new(
        req.panel_id.clone(),
        req.production_date,
        req.nominal_efficiency_pct,
        req.size_m2,
        req.manufacturer,
        req.manufacturing_footprint_kgco2,
        req.lifetime_years,
        req.carbon_reduction_factor,
        req.owner,
    )
    .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let issuance = state.ledger.register_panel(panel).await??;
    Ok(Json(RegisterPanelResponse {
        panel_id: req.panel_id,
        issuance: issuance.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
struct CreateTransactionRequest {
    sender: String,
    receiver: String,
    amount: String,
    panel_id: Option<String>,
    signature: String,
}

#[derive(Debug, Serialize)]
struct CreateTransactionResponse {
    txid: String,
}

async fn create_transaction(
    State(state): State<AppState>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<Json<CreateTransactionResponse>, ApiError> {
    let amount = Decimal::from_str(&req.amount).map_err(|e| ApiError::bad_request(format!("invalid amount: {e}")))?;
    let tx = Transaction::new(
        Account::from(req.sender),
        Account::from(req.receiver),
        amount,
        req.panel_id,
        req.signature,
    );
    let txid = tx.txid.clone();
    state.ledger.submit_transaction(tx).await??;
    Ok(Json(CreateTransactionResponse { txid }))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", content = "value")]
enum ContractArg {
    Text(String),
    Number(Decimal),
}

impl From<ContractArg> for ContractValue {
    fn from(arg: ContractArg) -> Self {
        match arg {
            ContractArg::Text(s) => ContractValue::Text(s),
            ContractArg::Number(n) => ContractValue::Number(n),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExecuteContractRequest {
    args: Vec<ContractArg>,
}

#[derive(Debug, Serialize)]
struct ExecuteContractResponse {
    result: String,
}

async fn execute_contract(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<ExecuteContractRequest>,
) -> Result<Json<ExecuteContractResponse>, ApiError> {
    let args: Vec<ContractValue> = req.args.into_iter().map(ContractValue::from).collect();
    let result = state.contracts.call(&name, &args)?;
    Ok(Json(ExecuteContractResponse {
        result: result.to_string(),
    }))
}
