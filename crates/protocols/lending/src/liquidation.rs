//! Position health and liquidation eligibility
//!
//! A position is liquidatable once its collateral no longer covers its debt,
//! interest included, at the liquidation threshold. Only the predicate and the
//! reporting around it live here. Settlement (seizure, incentives, partial
//! closes) is left to an external liquidator built on these reads.

use ledger_core::{AccountId, Amount, Result, Timestamp};
use serde::Serialize;

use crate::calculator::{self, Quote, Rounding};
use crate::pool::LendingPool;
use crate::state::{Account, HealthStatus};

/// Snapshot of one account's position at the current quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionHealth {
    pub account: AccountId,
    #[serde(with = "ledger_core::amount_string")]
    pub collateral: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub debt_with_interest: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub debt_in_native: Amount,
    /// Collateral needed to stay above the liquidation threshold
    #[serde(with = "ledger_core::amount_string")]
    pub liquidation_collateral: Amount,
    /// `None` when there is no debt
    pub health_factor_bps: Option<Amount>,
    pub status: HealthStatus,
    pub liquidatable: bool,
}

impl LendingPool {
    /// Whether the account's collateral is below its debt at the liquidation
    /// threshold
    pub fn is_liquidatable(&self, id: &AccountId) -> Result<bool> {
        let quote = self.quote()?;
        self.is_liquidatable_at(&self.account(id), quote, self.now())
    }

    pub fn position_health(&self, id: &AccountId) -> Result<PositionHealth> {
        let quote = self.quote()?;
        let now = self.now();
        let account = self.account(id);
        let decimals = self.params.decimals();

        let debt_with_interest = self.debt_with_interest_at(&account, quote, now)?;
        let debt_in_native =
            calculator::stable_to_native(debt_with_interest, quote, decimals, Rounding::Down)?;
        let liquidation_collateral = calculator::collateral_required(
            debt_with_interest,
            self.params.liquidation_threshold(),
            quote,
            decimals,
        )?;
        let health_factor_bps = calculator::health_factor_bps(
            account.collateral_posted,
            debt_in_native,
            self.params.liquidation_threshold(),
        )?;

        Ok(PositionHealth {
            account: *id,
            collateral: account.collateral_posted,
            debt_with_interest,
            debt_in_native,
            liquidation_collateral,
            health_factor_bps,
            status: calculator::health_status(health_factor_bps),
            liquidatable: account.collateral_posted < liquidation_collateral,
        })
    }

    /// Accounts currently eligible for liquidation, in ascending id order
    pub fn liquidatable_accounts(&self) -> Result<Vec<AccountId>> {
        let quote = self.quote()?;
        let now = self.now();

        let mut eligible = Vec::new();
        for (id, account) in self.state.accounts() {
            if self.is_liquidatable_at(account, quote, now)? {
                eligible.push(*id);
            }
        }
        eligible.sort();

        if !eligible.is_empty() {
            tracing::info!(count = eligible.len(), "Liquidatable positions found");
        }
        Ok(eligible)
    }

    fn is_liquidatable_at(&self, account: &Account, quote: Quote, now: Timestamp) -> Result<bool> {
        if !account.has_debt() {
            return Ok(false);
        }
        let debt = self.debt_with_interest_at(account, quote, now)?;
        let threshold_collateral = calculator::collateral_required(
            debt,
            self.params.liquidation_threshold(),
            quote,
            self.params.decimals(),
        )?;
        Ok(account.collateral_posted < threshold_collateral)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::testing::*;
    use crate::state::HealthStatus;

    fn borrowed_position() -> Harness {
        let mut h = Harness::new();
        h.pool.post_collateral(&bob(), 10 * ETH).unwrap();
        h.pool.borrow(&bob(), 12_000 * USDT).unwrap();
        h
    }

    #[test]
    fn test_debt_free_account_is_never_liquidatable() {
        let mut h = Harness::new();
        h.pool.post_collateral(&alice(), ETH).unwrap();
        h.set_usd_per_eth(1);

        assert!(!h.pool.is_liquidatable(&alice()).unwrap());
        let health = h.pool.position_health(&alice()).unwrap();
        assert_eq!(health.health_factor_bps, None);
        assert_eq!(health.status, HealthStatus::Healthy);
        assert!(!health.liquidatable);
    }

    #[test]
    fn test_price_drop_flips_predicate() {
        let h = borrowed_position();
        assert!(!h.pool.is_liquidatable(&bob()).unwrap());

        // 12_000 USDT at 125% needs 15_000 USD of collateral: 1500 USD/ETH
        h.set_usd_per_eth(1_500);
        assert!(!h.pool.is_liquidatable(&bob()).unwrap());

        h.set_usd_per_eth(1_499);
        assert!(h.pool.is_liquidatable(&bob()).unwrap());
        assert_eq!(h.pool.liquidatable_accounts().unwrap(), vec![bob()]);
    }

    #[test]
    fn test_position_health_report() {
        let h = borrowed_position();
        let health = h.pool.position_health(&bob()).unwrap();

        assert_eq!(health.collateral, 10 * ETH);
        assert_eq!(health.debt_with_interest, 12_000 * USDT);
        assert_eq!(health.debt_in_native, 6 * ETH);
        assert_eq!(health.liquidation_collateral, 15 * ETH / 2);
        // 10 / (6 * 1.25)
        assert_eq!(health.health_factor_bps, Some(13_333));
        assert_eq!(health.status, HealthStatus::Warning);
        assert!(!health.liquidatable);

        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["debt_in_native"], "6000000000000000000");
        assert_eq!(json["status"], "warning");
    }

    #[test]
    fn test_interest_can_push_position_over_threshold() {
        let mut h = borrowed_position();
        h.pool.deposit(&alice(), ETH).unwrap();
        h.set_usd_per_eth(1_510);
        assert!(!h.pool.is_liquidatable(&bob()).unwrap());

        // Debt far above liquidity keeps the rate at its 81% maximum
        h.clock.advance(86_400 * 30);
        assert!(h.pool.is_liquidatable(&bob()).unwrap());
        assert_eq!(h.pool.position_health(&bob()).unwrap().status, HealthStatus::Danger);
    }

    #[test]
    fn test_liquidatable_accounts_sorted() {
        let mut h = Harness::new();
        for id in [bob(), alice()] {
            h.pool.post_collateral(&id, 10 * ETH).unwrap();
            h.pool.borrow(&id, 13_000 * USDT).unwrap();
        }
        assert!(h.pool.liquidatable_accounts().unwrap().is_empty());

        h.set_usd_per_eth(1_000);
        assert_eq!(h.pool.liquidatable_accounts().unwrap(), vec![alice(), bob()]);
    }
}
