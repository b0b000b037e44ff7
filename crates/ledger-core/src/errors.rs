//! Error types for the lending pool ledger

use thiserror::Error;

use crate::types::Amount;

/// Rejections raised by ledger operations.
///
/// Every variant is a normal, recoverable outcome: the failing call leaves the
/// ledger untouched and the caller decides whether to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Withdrawal amount and shares burned must both be greater than zero")]
    InvalidWithdrawalParameters,

    #[error("Insufficient principal: requested {requested}, deposited {available}")]
    InsufficientPrincipal { requested: Amount, available: Amount },

    #[error("Insufficient shares: requested {requested}, held {available}")]
    InsufficientShares { requested: Amount, available: Amount },

    #[error("Deposit of {amount} would mint zero shares")]
    InsufficientSharesMinted { amount: Amount },

    #[error("Withdrawal would empty pool liquidity while {remaining_shares} shares stay outstanding")]
    WithdrawalDrainsLiquidity { remaining_shares: Amount },

    #[error("Insufficient collateral: need {required}, posted {posted}")]
    InsufficientCollateral { required: Amount, posted: Amount },

    #[error("Collateral withdrawal of {requested} exceeds available {available}")]
    ExceedsAvailableCollateral { requested: Amount, available: Amount },

    #[error("Account has no outstanding debt")]
    NoOutstandingDebt,

    #[error("Repayment of {requested} exceeds debt of {owed}")]
    RepaymentExceedsDebt { requested: Amount, owed: Amount },

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Arithmetic underflow")]
    ArithmeticUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid account '{input}': {reason}")]
    InvalidAccount { input: String, reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),
}

/// Failures reported by the oracle, share token, or asset ledgers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("Price oracle unavailable: {reason}")]
    OracleUnavailable { reason: String },

    #[error("Price oracle returned an invalid quote: {reason}")]
    InvalidQuote { reason: String },

    #[error("{asset} transfer rejected: {reason}")]
    TransferRejected { asset: String, reason: String },

    #[error("Share token rejected {action}: {reason}")]
    TokenRejected { action: String, reason: String },
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(#[from] LedgerError),
}

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroAmount => "zero_amount",
            Self::InvalidWithdrawalParameters => "invalid_withdrawal_parameters",
            Self::InsufficientPrincipal { .. } => "insufficient_principal",
            Self::InsufficientShares { .. } => "insufficient_shares",
            Self::InsufficientSharesMinted { .. } => "insufficient_shares_minted",
            Self::WithdrawalDrainsLiquidity { .. } => "withdrawal_drains_liquidity",
            Self::InsufficientCollateral { .. } => "insufficient_collateral",
            Self::ExceedsAvailableCollateral { .. } => "exceeds_available_collateral",
            Self::NoOutstandingDebt => "no_outstanding_debt",
            Self::RepaymentExceedsDebt { .. } => "repayment_exceeds_debt",
            Self::ArithmeticOverflow => "arithmetic_overflow",
            Self::ArithmeticUnderflow => "arithmetic_underflow",
            Self::DivisionByZero => "division_by_zero",
            Self::InvalidAccount { .. } => "invalid_account",
            Self::InvalidConfiguration { .. } => "invalid_configuration",
            Self::Collaborator(_) => "collaborator_error",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ZeroAmount
            | Self::InvalidWithdrawalParameters
            | Self::InvalidAccount { .. } => 400,
            Self::InsufficientPrincipal { .. }
            | Self::InsufficientShares { .. }
            | Self::InsufficientSharesMinted { .. }
            | Self::WithdrawalDrainsLiquidity { .. }
            | Self::InsufficientCollateral { .. }
            | Self::ExceedsAvailableCollateral { .. }
            | Self::NoOutstandingDebt
            | Self::RepaymentExceedsDebt { .. } => 422,
            Self::ArithmeticOverflow | Self::ArithmeticUnderflow | Self::DivisionByZero => 422,
            Self::InvalidConfiguration { .. } => 500,
            Self::Collaborator(_) => 502,
        }
    }
}
