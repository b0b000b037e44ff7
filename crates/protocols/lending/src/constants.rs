//! Lending Pool Constants
//!
//! Fixed values used by the accounting engine. Tunable values live in
//! `ledger_core::RiskConfig`.

/// Asset labels used in logs and collaborator errors
pub mod assets {
    pub const NATIVE: &str = "native";
    pub const STABLE: &str = "stable";
}

/// Interest accrual constants
pub mod interest {
    use ledger_core::constants::BPS_DENOMINATOR;

    /// Utilization is capped at 100% even if debt value outgrows pooled liquidity
    pub const MAX_UTILIZATION_BPS: u128 = BPS_DENOMINATOR;
}

/// Health factor thresholds for status reporting
///
/// Health factor = collateral / (debt_in_native * liquidation_threshold / 100),
/// expressed in basis points (10_000 = 1.0)
/// - >= HEALTHY_FACTOR_BPS (1.5): Safe position
/// - >= WARNING_FACTOR_BPS (1.2): At risk
/// - < WARNING_FACTOR_BPS: Close to liquidation
pub mod health {
    pub const HEALTHY_FACTOR_BPS: u128 = 15_000;
    pub const WARNING_FACTOR_BPS: u128 = 12_000;
}
