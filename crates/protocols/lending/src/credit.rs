//! Credit operations
//!
//! Collateral is posted in the native asset; loans are paid out in the stable
//! asset and priced through the oracle on every call. Interest accrues as
//! simple interest on the debt principal since the last debt change, at a rate
//! taken from the current utilization.

use ledger_core::{AccountId, Amount, LedgerError, Result, Timestamp};

use crate::calculator::{self, checked_add, checked_sub, Quote, Rounding};
use crate::events::PoolEvent;
use crate::pool::{collaborator_failure, rejected, LendingPool};
use crate::state::{Account, PoolTotals};

impl LendingPool {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Utilization in basis points: debt valued in native units over liquidity
    pub fn utilization_bps(&self) -> Result<Amount> {
        let quote = self.quote()?;
        self.utilization_at(quote, self.totals())
    }

    /// Current annual borrow rate in basis points
    pub fn borrow_rate_bps(&self) -> Result<Amount> {
        let quote = self.quote()?;
        self.borrow_rate_at(quote, self.totals())
    }

    /// Interest accrued on the account's debt since its last debt change
    pub fn accrued_interest_of(&self, id: &AccountId) -> Result<Amount> {
        let quote = self.quote()?;
        self.accrued_interest_at(&self.account(id), quote, self.now())
    }

    pub fn debt_with_interest_of(&self, id: &AccountId) -> Result<Amount> {
        let quote = self.quote()?;
        self.debt_with_interest_at(&self.account(id), quote, self.now())
    }

    /// Debt with interest valued in native units at the current quote
    pub fn debt_in_native_of(&self, id: &AccountId) -> Result<Amount> {
        let quote = self.quote()?;
        let debt = self.debt_with_interest_at(&self.account(id), quote, self.now())?;
        calculator::stable_to_native(debt, quote, self.params.decimals(), Rounding::Down)
    }

    /// Native collateral needed to back `debt` stable units at the
    /// collateralization ratio
    pub fn collateral_required_for(&self, debt: Amount) -> Result<Amount> {
        let quote = self.quote()?;
        self.collateral_required_at(debt, quote)
    }

    /// Collateral the account could withdraw without breaching the
    /// collateralization ratio for its debt principal. Zero when a price move
    /// has left the position under-collateralized.
    pub fn available_collateral_of(&self, id: &AccountId) -> Result<Amount> {
        let quote = self.quote()?;
        let account = self.account(id);
        let required = self.collateral_required_at(account.debt_principal, quote)?;
        Ok(account.collateral_posted.saturating_sub(required))
    }

    /// Additional stable units the account could borrow right now
    pub fn max_borrow_of(&self, id: &AccountId) -> Result<Amount> {
        let quote = self.quote()?;
        let account = self.account(id);
        let ceiling = calculator::max_debt_for_collateral(
            account.collateral_posted,
            self.params.collateralization_ratio(),
            quote,
            self.params.decimals(),
        )?;
        let debt = self.debt_with_interest_at(&account, quote, self.now())?;
        Ok(ceiling.saturating_sub(debt))
    }

    pub(crate) fn utilization_at(&self, quote: Quote, totals: &PoolTotals) -> Result<Amount> {
        let debt_in_native = calculator::stable_to_native(
            totals.total_debt_principal,
            quote,
            self.params.decimals(),
            Rounding::Down,
        )?;
        calculator::utilization_bps(debt_in_native, totals.total_liquidity)
    }

    pub(crate) fn borrow_rate_at(&self, quote: Quote, totals: &PoolTotals) -> Result<Amount> {
        let utilization = self.utilization_at(quote, totals)?;
        calculator::borrow_rate_bps(utilization, self.params.rate_curve())
    }

    pub(crate) fn accrued_interest_at(
        &self,
        account: &Account,
        quote: Quote,
        now: Timestamp,
    ) -> Result<Amount> {
        if !account.has_debt() {
            return Ok(0);
        }
        let rate = self.borrow_rate_at(quote, self.totals())?;
        calculator::accrued_interest(account.debt_principal, rate, account.debt_opened_at, now)
    }

    pub(crate) fn debt_with_interest_at(
        &self,
        account: &Account,
        quote: Quote,
        now: Timestamp,
    ) -> Result<Amount> {
        let interest = self.accrued_interest_at(account, quote, now)?;
        checked_add(account.debt_principal, interest)
    }

    fn collateral_required_at(&self, debt: Amount, quote: Quote) -> Result<Amount> {
        calculator::collateral_required(
            debt,
            self.params.collateralization_ratio(),
            quote,
            self.params.decimals(),
        )
    }

    // =========================================================================
    // Collateral
    // =========================================================================

    /// Pledge `amount` native units as collateral
    pub fn post_collateral(&mut self, account: &AccountId, amount: Amount) -> Result<PoolEvent> {
        if amount == 0 {
            return Err(rejected("post_collateral", account, LedgerError::ZeroAmount));
        }

        let mut staged = self.state.stage(account);
        staged.account.collateral_posted = checked_add(staged.account.collateral_posted, amount)?;
        staged.totals.total_collateral = checked_add(staged.totals.total_collateral, amount)?;

        self.collaborators
            .native
            .transfer_in(account, amount)
            .map_err(|e| collaborator_failure("post_collateral", Some(account), e))?;

        Ok(self.commit(
            staged,
            PoolEvent::CollateralDeposited {
                account: *account,
                amount,
            },
        ))
    }

    /// Release `amount` native units of collateral back to the account
    pub fn withdraw_collateral(&mut self, account: &AccountId, amount: Amount) -> Result<PoolEvent> {
        if amount == 0 {
            return Err(rejected("withdraw_collateral", account, LedgerError::ZeroAmount));
        }

        let available = self.available_collateral_of(account)?;
        if amount > available {
            return Err(rejected(
                "withdraw_collateral",
                account,
                LedgerError::ExceedsAvailableCollateral {
                    requested: amount,
                    available,
                },
            ));
        }

        // What stays posted must also back interest accrued since the last debt change
        let quote = self.quote()?;
        let current = self.account(account);
        let remaining = checked_sub(current.collateral_posted, amount)?;
        let owed = self.debt_with_interest_at(&current, quote, self.now())?;
        let required = self.collateral_required_at(owed, quote)?;
        if remaining < required {
            return Err(rejected(
                "withdraw_collateral",
                account,
                LedgerError::InsufficientCollateral {
                    required,
                    posted: remaining,
                },
            ));
        }

        let mut staged = self.state.stage(account);
        staged.account.collateral_posted = checked_sub(staged.account.collateral_posted, amount)?;
        staged.totals.total_collateral = checked_sub(staged.totals.total_collateral, amount)?;

        self.collaborators
            .native
            .transfer_out(account, amount)
            .map_err(|e| collaborator_failure("withdraw_collateral", Some(account), e))?;

        Ok(self.commit(
            staged,
            PoolEvent::CollateralWithdrawn {
                account: *account,
                amount,
            },
        ))
    }

    // =========================================================================
    // Loans
    // =========================================================================

    /// Borrow `amount` stable units against posted collateral.
    ///
    /// Interest accrued on existing debt is folded into principal first, so
    /// the collateral check covers everything owed and accrual restarts now.
    pub fn borrow(&mut self, account: &AccountId, amount: Amount) -> Result<PoolEvent> {
        if amount == 0 {
            return Err(rejected("borrow", account, LedgerError::ZeroAmount));
        }

        let quote = self.quote()?;
        let now = self.now();
        let current = self.account(account);
        let accrued = self.accrued_interest_at(&current, quote, now)?;
        let new_debt = checked_add(checked_add(current.debt_principal, accrued)?, amount)?;

        let required = self.collateral_required_at(new_debt, quote)?;
        if current.collateral_posted < required {
            return Err(rejected(
                "borrow",
                account,
                LedgerError::InsufficientCollateral {
                    required,
                    posted: current.collateral_posted,
                },
            ));
        }

        let native_value =
            calculator::stable_to_native(amount, quote, self.params.decimals(), Rounding::Down)?;

        let mut staged = self.state.stage(account);
        staged.account.debt_principal = new_debt;
        staged.account.debt_opened_at = now;
        staged.totals.total_debt_principal = checked_add(
            checked_add(staged.totals.total_debt_principal, accrued)?,
            amount,
        )?;

        tracing::debug!(
            account = %account,
            amount,
            accrued,
            new_debt,
            required_collateral = required,
            "Borrow staged"
        );

        self.collaborators
            .stable
            .transfer_out(account, amount)
            .map_err(|e| collaborator_failure("borrow", Some(account), e))?;

        Ok(self.commit(
            staged,
            PoolEvent::LoanBorrowed {
                account: *account,
                amount,
                native_value,
            },
        ))
    }

    /// Repay `amount` stable units. Accrued interest is settled before
    /// principal; the remainder becomes the new principal and accrual
    /// restarts now.
    pub fn repay(&mut self, account: &AccountId, amount: Amount) -> Result<PoolEvent> {
        if amount == 0 {
            return Err(rejected("repay", account, LedgerError::ZeroAmount));
        }

        let current = self.account(account);
        if !current.has_debt() {
            return Err(rejected("repay", account, LedgerError::NoOutstandingDebt));
        }

        let quote = self.quote()?;
        let now = self.now();
        let accrued = self.accrued_interest_at(&current, quote, now)?;
        let owed = checked_add(current.debt_principal, accrued)?;
        if amount > owed {
            return Err(rejected(
                "repay",
                account,
                LedgerError::RepaymentExceedsDebt {
                    requested: amount,
                    owed,
                },
            ));
        }

        let interest_paid = amount.min(accrued);
        let new_principal = owed - amount;

        let mut staged = self.state.stage(account);
        staged.totals.total_debt_principal = checked_add(
            checked_sub(staged.totals.total_debt_principal, current.debt_principal)?,
            new_principal,
        )?;
        staged.totals.total_interest_collected =
            checked_add(staged.totals.total_interest_collected, interest_paid)?;
        staged.account.debt_principal = new_principal;
        staged.account.debt_opened_at = now;

        tracing::debug!(
            account = %account,
            amount,
            interest_paid,
            new_principal,
            "Repayment staged"
        );

        self.collaborators
            .stable
            .transfer_in(account, amount)
            .map_err(|e| collaborator_failure("repay", Some(account), e))?;

        Ok(self.commit(
            staged,
            PoolEvent::LoanRepaid {
                account: *account,
                amount,
                interest_paid,
            },
        ))
    }
}
