//! Data Transfer Objects for API requests and responses

use axum::{http::StatusCode, Json};
use ledger_core::{AccountId, Amount, LedgerError};
use lending::{PoolEvent, PositionHealth};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Pool-wide aggregates and current market figures
#[derive(Debug, Clone, Serialize)]
pub struct PoolResponse {
    #[serde(with = "ledger_core::amount_string")]
    pub total_liquidity: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub total_collateral: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub total_debt_principal: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub total_interest_collected: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub total_shares: Amount,
    pub utilization_bps: Amount,
    pub borrow_rate_bps: Amount,
    /// Stable units per whole native unit, scaled by `price_decimals`
    #[serde(with = "ledger_core::amount_string")]
    pub price: Amount,
    pub price_decimals: u8,
    pub collateralization_ratio: Amount,
    pub liquidation_threshold: Amount,
    pub accounts: usize,
}

/// One participant's position
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub account: AccountId,
    #[serde(with = "ledger_core::amount_string")]
    pub deposit_principal: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub share_balance: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub share_value: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub collateral: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub debt_principal: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub debt_with_interest: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub available_collateral: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub max_borrow: Amount,
    pub health: PositionHealth,
}

/// Request body for single-amount operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountRequest {
    pub account: AccountId,
    #[serde(with = "ledger_core::amount_string")]
    pub amount: Amount,
}

/// Request body for deposit withdrawal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub account: AccountId,
    #[serde(with = "ledger_core::amount_string")]
    pub amount: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub shares: Amount,
}

/// Result of a committed operation
#[derive(Debug, Clone, Serialize)]
pub struct OperationResponse {
    pub sequence: u64,
    pub event: PoolEvent,
}

/// Query for the event feed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsQuery {
    /// Return only events after this sequence number
    #[serde(default)]
    pub since: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiquidatableResponse {
    pub accounts: Vec<AccountId>,
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Error half of every handler result
pub type ApiFailure = (StatusCode, Json<ApiError>);

impl From<&LedgerError> for ApiError {
    fn from(err: &LedgerError) -> Self {
        Self::new(err.error_code(), err.to_string())
    }
}

/// Map a ledger error to its HTTP status and body
pub fn ledger_failure(err: LedgerError) -> ApiFailure {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::warn!(code = err.error_code(), error = %err, "Request failed");
    }
    (status, Json(ApiError::from(&err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_failure_status() {
        let (status, Json(body)) = ledger_failure(LedgerError::ZeroAmount);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "zero_amount");

        let (status, _) = ledger_failure(LedgerError::NoOutstandingDebt);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_amount_request_parses_string_amounts() {
        let req: AmountRequest = serde_json::from_str(
            r#"{"account":"0x0000000000000000000000000000000000000001","amount":"10000000000000000000"}"#,
        )
        .unwrap();
        assert_eq!(req.account, AccountId::from_low_u64(1));
        assert_eq!(req.amount, 10_000_000_000_000_000_000);
    }
}
