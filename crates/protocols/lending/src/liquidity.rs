//! Liquidity operations
//!
//! Depositors add native liquidity and receive pool shares. Withdrawal has two
//! independent parts: a principal amount, bounded by what the account
//! deposited, and a number of shares redeemed at the current share price.

use ledger_core::{AccountId, Amount, LedgerError, Result};

use crate::calculator::{self, checked_add, checked_sub};
use crate::events::PoolEvent;
use crate::pool::{collaborator_failure, rejected, LendingPool, ShareReversal};

impl LendingPool {
    /// Shares a deposit of `amount` would mint right now
    pub fn preview_deposit(&self, amount: Amount) -> Result<Amount> {
        calculator::shares_for_deposit(
            amount,
            self.total_shares(),
            self.total_liquidity(),
            self.params.native_unit(),
        )
    }

    /// Native value `shares` currently redeem for
    pub fn preview_redeem(&self, shares: Amount) -> Result<Amount> {
        let supply = self.total_shares();
        if shares == 0 || supply == 0 {
            return Ok(0);
        }
        calculator::redemption_value(shares, self.total_liquidity(), supply)
    }

    /// Add `amount` native units of liquidity and mint shares to `account`
    pub fn deposit(&mut self, account: &AccountId, amount: Amount) -> Result<PoolEvent> {
        if amount == 0 {
            return Err(rejected("deposit", account, LedgerError::ZeroAmount));
        }

        let shares_minted = self.preview_deposit(amount)?;
        if shares_minted == 0 {
            return Err(rejected(
                "deposit",
                account,
                LedgerError::InsufficientSharesMinted { amount },
            ));
        }

        let mut staged = self.state.stage(account);
        staged.account.deposit_principal = checked_add(staged.account.deposit_principal, amount)?;
        staged.totals.total_liquidity = checked_add(staged.totals.total_liquidity, amount)?;

        tracing::debug!(
            account = %account,
            amount,
            shares_minted,
            "Deposit staged"
        );

        self.collaborators
            .shares
            .mint(account, shares_minted)
            .map_err(|e| collaborator_failure("deposit", Some(account), e))?;

        if let Err(e) = self.collaborators.native.transfer_in(account, amount) {
            self.reverse_shares(account, ShareReversal::Burn(shares_minted));
            return Err(collaborator_failure("deposit", Some(account), e));
        }

        Ok(self.commit(
            staged,
            PoolEvent::Deposited {
                account: *account,
                amount,
                shares_minted,
            },
        ))
    }

    /// Withdraw `withdraw_amount` of principal and redeem `shares_burned`
    /// shares; the account receives both as one native payout
    pub fn withdraw(
        &mut self,
        account: &AccountId,
        withdraw_amount: Amount,
        shares_burned: Amount,
    ) -> Result<PoolEvent> {
        if withdraw_amount == 0 || shares_burned == 0 {
            return Err(rejected(
                "withdraw",
                account,
                LedgerError::InvalidWithdrawalParameters,
            ));
        }

        let principal = self.deposit_principal_of(account);
        if withdraw_amount > principal {
            return Err(rejected(
                "withdraw",
                account,
                LedgerError::InsufficientPrincipal {
                    requested: withdraw_amount,
                    available: principal,
                },
            ));
        }

        let held = self.share_balance_of(account);
        if shares_burned > held {
            return Err(rejected(
                "withdraw",
                account,
                LedgerError::InsufficientShares {
                    requested: shares_burned,
                    available: held,
                },
            ));
        }

        let redemption =
            calculator::redemption_value(shares_burned, self.total_liquidity(), self.total_shares())?;
        let total_payout = checked_add(withdraw_amount, redemption)?;
        let remaining_liquidity = checked_sub(self.total_liquidity(), total_payout)
            .map_err(|e| rejected("withdraw", account, e))?;

        // Outstanding shares must always be backed by some liquidity
        let remaining_shares = checked_sub(self.total_shares(), shares_burned)?;
        if remaining_liquidity == 0 && remaining_shares > 0 {
            return Err(rejected(
                "withdraw",
                account,
                LedgerError::WithdrawalDrainsLiquidity { remaining_shares },
            ));
        }

        let mut staged = self.state.stage(account);
        staged.account.deposit_principal =
            checked_sub(staged.account.deposit_principal, withdraw_amount)?;
        staged.totals.total_liquidity = remaining_liquidity;

        tracing::debug!(
            account = %account,
            withdraw_amount,
            redemption,
            total_payout,
            shares_burned,
            "Withdrawal staged"
        );

        self.collaborators
            .shares
            .burn(account, shares_burned)
            .map_err(|e| collaborator_failure("withdraw", Some(account), e))?;

        if let Err(e) = self.collaborators.native.transfer_out(account, total_payout) {
            self.reverse_shares(account, ShareReversal::Mint(shares_burned));
            return Err(collaborator_failure("withdraw", Some(account), e));
        }

        Ok(self.commit(
            staged,
            PoolEvent::DepositWithdrawn {
                account: *account,
                total_payout,
                shares_burned,
            },
        ))
    }
}
