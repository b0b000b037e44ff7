//! Lending State Types
//!
//! Account records, pool aggregates, and the staging area used to apply an
//! operation's ledger changes all at once.

use std::collections::HashMap;

use ledger_core::{AccountId, Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// One participant's position. Created lazily, never removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Native units deposited and not yet withdrawn as principal
    #[serde(with = "ledger_core::amount_string")]
    pub deposit_principal: Amount,
    /// Native units pledged as collateral
    #[serde(with = "ledger_core::amount_string")]
    pub collateral_posted: Amount,
    /// Stable units owed, excluding interest accrued since `debt_opened_at`
    #[serde(with = "ledger_core::amount_string")]
    pub debt_principal: Amount,
    /// Time of the last debt change
    pub debt_opened_at: Timestamp,
}

impl Account {
    pub fn has_debt(&self) -> bool {
        self.debt_principal > 0
    }
}

/// Pool-wide aggregates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTotals {
    #[serde(with = "ledger_core::amount_string")]
    pub total_liquidity: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub total_collateral: Amount,
    #[serde(with = "ledger_core::amount_string")]
    pub total_debt_principal: Amount,
    /// Stable units received as interest, never decreases
    #[serde(with = "ledger_core::amount_string")]
    pub total_interest_collected: Amount,
}

/// Ledger changes computed by one operation. Nothing is visible until
/// [`LedgerState::commit`] applies it.
#[derive(Debug, Clone)]
pub struct StagedChange {
    pub account_id: AccountId,
    pub account: Account,
    pub totals: PoolTotals,
}

/// Durable ledger: all accounts plus the pool aggregates
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    accounts: HashMap<AccountId, Account>,
    totals: PoolTotals,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account record, or an empty one for an unknown participant
    pub fn account(&self, id: &AccountId) -> Account {
        self.accounts.get(id).copied().unwrap_or_default()
    }

    pub fn totals(&self) -> &PoolTotals {
        &self.totals
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &Account)> {
        self.accounts.iter()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Copy the account and totals into a staging area
    pub fn stage(&self, id: &AccountId) -> StagedChange {
        StagedChange {
            account_id: *id,
            account: self.account(id),
            totals: self.totals,
        }
    }

    pub fn commit(&mut self, change: StagedChange) {
        self.accounts.insert(change.account_id, change.account);
        self.totals = change.totals;
    }

    /// Check that the collateral and debt aggregates equal the per-account sums
    pub fn aggregates_consistent(&self) -> bool {
        let mut collateral: Amount = 0;
        let mut debt: Amount = 0;
        for account in self.accounts.values() {
            collateral = match collateral.checked_add(account.collateral_posted) {
                Some(v) => v,
                None => return false,
            };
            debt = match debt.checked_add(account.debt_principal) {
                Some(v) => v,
                None => return false,
            };
        }
        collateral == self.totals.total_collateral && debt == self.totals.total_debt_principal
    }
}

/// Health factor status for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy, // >= 1.5
    Warning, // >= 1.2 and < 1.5
    Danger,  // < 1.2
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}
