//! Maps `carbon_core` errors onto HTTP status codes and a JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use carbon_core::error::{ChainError, ContractError, RegistryError, TransactionError};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let status = match err {
            RegistryError::PanelAlreadyRegistered(_) => StatusCode::CONFLICT,
            RegistryError::PanelUnknown(_) => StatusCode::NOT_FOUND,
        };
        Self::new(status, err.to_string())
    }
}

impl From<TransactionError> for ApiError {
    fn from(err: TransactionError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<ContractError> for ApiError {
    fn from(err: ContractError) -> Self {
        let status = match err {
            ContractError::NotFound(_) => StatusCode::NOT_FOUND,
            ContractError::InvalidArguments(..) => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<carbon_core::ledger::LedgerGone> for ApiError {
    fn from(_: carbon_core::ledger::LedgerGone) -> Self {
        Self::internal("ledger actor is not running")
    }
}
