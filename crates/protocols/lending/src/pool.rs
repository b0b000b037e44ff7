//! Lending Pool
//!
//! The pool owns the ledger, the event log, the risk parameters, and its
//! collaborators. Operations live in `liquidity`, `credit`, and `liquidation`;
//! this module holds construction, plain reads, and the transaction plumbing
//! they share.
//!
//! Every mutating operation follows the same shape:
//! 1. validate arguments and read the current state,
//! 2. stage the new account and totals in a [`StagedChange`],
//! 3. run share-token effects, then the asset transfer last,
//! 4. on failure undo the share-token effect and drop the staged change,
//! 5. on success commit the staged change and record one event.
//!
//! Mutations take `&mut self`, so holding the pool behind a single lock gives
//! the required total order.

use ledger_core::{AccountId, Amount, AppConfig, CollaboratorError, LedgerError, Result, Timestamp};

use crate::calculator::{self, Quote, Rounding};
use crate::capabilities::{AssetLedger, Collaborators};
use crate::events::{EventLog, EventRecord, PoolEvent};
use crate::risk::RiskParameters;
use crate::state::{Account, LedgerState, PoolTotals, StagedChange};

pub struct LendingPool {
    pub(crate) params: RiskParameters,
    pub(crate) state: LedgerState,
    pub(crate) events: EventLog,
    pub(crate) collaborators: Collaborators,
}

/// Share-token effect to reverse when the asset transfer that follows it fails
#[derive(Debug, Clone, Copy)]
pub(crate) enum ShareReversal {
    Burn(Amount),
    Mint(Amount),
}

impl LendingPool {
    pub fn new(params: RiskParameters, collaborators: Collaborators) -> Self {
        tracing::info!(
            collateralization_ratio = params.collateralization_ratio(),
            liquidation_threshold = params.liquidation_threshold(),
            "Lending pool created"
        );
        Self {
            params,
            state: LedgerState::new(),
            events: EventLog::new(),
            collaborators,
        }
    }

    /// Build a pool from configuration with in-memory collaborators
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let params = RiskParameters::new(&config.risk, &config.assets)?;
        Ok(Self::new(params, Collaborators::in_memory(config)))
    }

    // =========================================================================
    // Plain reads
    // =========================================================================

    pub fn params(&self) -> &RiskParameters {
        &self.params
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn totals(&self) -> &PoolTotals {
        self.state.totals()
    }

    pub fn account(&self, id: &AccountId) -> Account {
        self.state.account(id)
    }

    pub fn deposit_principal_of(&self, id: &AccountId) -> Amount {
        self.state.account(id).deposit_principal
    }

    pub fn collateral_of(&self, id: &AccountId) -> Amount {
        self.state.account(id).collateral_posted
    }

    /// Debt principal, without interest accrued since the last debt change
    pub fn debt_of(&self, id: &AccountId) -> Amount {
        self.state.account(id).debt_principal
    }

    pub fn total_liquidity(&self) -> Amount {
        self.state.totals().total_liquidity
    }

    pub fn total_collateral(&self) -> Amount {
        self.state.totals().total_collateral
    }

    pub fn total_debt_principal(&self) -> Amount {
        self.state.totals().total_debt_principal
    }

    pub fn total_interest_collected(&self) -> Amount {
        self.state.totals().total_interest_collected
    }

    pub fn share_balance_of(&self, id: &AccountId) -> Amount {
        self.collaborators.shares.balance_of(id)
    }

    pub fn total_shares(&self) -> Amount {
        self.collaborators.shares.total_supply()
    }

    pub fn native_asset(&self) -> &dyn AssetLedger {
        self.collaborators.native.as_ref()
    }

    pub fn stable_asset(&self) -> &dyn AssetLedger {
        self.collaborators.stable.as_ref()
    }

    pub fn events(&self) -> &[EventRecord] {
        self.events.records()
    }

    pub fn events_since(&self, sequence: u64) -> &[EventRecord] {
        self.events.since(sequence)
    }

    pub fn now(&self) -> Timestamp {
        self.collaborators.clock.now()
    }

    /// Current oracle quote
    pub fn quote(&self) -> Result<Quote> {
        self.collaborators
            .oracle
            .quote()
            .map_err(|e| collaborator_failure("quote", None, e))
    }

    /// Stable value of a native amount at the current quote, floored
    pub fn quote_native_to_stable(&self, native: Amount) -> Result<Amount> {
        let quote = self.quote()?;
        calculator::native_to_stable(native, quote, self.params.decimals(), Rounding::Down)
    }

    /// Native value of a stable amount at the current quote, floored
    pub fn quote_stable_to_native(&self, stable: Amount) -> Result<Amount> {
        let quote = self.quote()?;
        calculator::stable_to_native(stable, quote, self.params.decimals(), Rounding::Down)
    }

    // =========================================================================
    // Transaction plumbing
    // =========================================================================

    /// Apply a staged change and append its event
    pub(crate) fn commit(&mut self, change: StagedChange, event: PoolEvent) -> PoolEvent {
        self.state.commit(change);
        let now = self.now();
        let record = self.events.append(now, event);
        tracing::info!(
            sequence = record.sequence,
            event = record.event.name(),
            account = %record.event.account(),
            "Pool event recorded"
        );
        record.event.clone()
    }

    /// Undo a share-token effect after the asset transfer that followed it failed
    pub(crate) fn reverse_shares(&mut self, account: &AccountId, reversal: ShareReversal) {
        let result = match reversal {
            ShareReversal::Burn(amount) => self.collaborators.shares.burn(account, amount),
            ShareReversal::Mint(amount) => self.collaborators.shares.mint(account, amount),
        };
        match result {
            Ok(()) => tracing::warn!(account = %account, ?reversal, "Share effect reversed"),
            Err(e) => tracing::error!(
                account = %account,
                ?reversal,
                error = %e,
                "Failed to reverse share effect; share supply no longer matches the ledger"
            ),
        }
    }
}

/// Convert a collaborator failure into a ledger error, logging it
pub(crate) fn collaborator_failure(
    operation: &str,
    account: Option<&AccountId>,
    error: CollaboratorError,
) -> LedgerError {
    match account {
        Some(account) => tracing::warn!(
            operation,
            account = %account,
            error = %error,
            "Collaborator call failed"
        ),
        None => tracing::warn!(operation, error = %error, "Collaborator call failed"),
    }
    LedgerError::Collaborator(error)
}

/// Log a business-rule rejection and pass it through
pub(crate) fn rejected(operation: &str, account: &AccountId, error: LedgerError) -> LedgerError {
    tracing::warn!(operation, account = %account, error = %error, "Operation rejected");
    error
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::capabilities::ShareToken;
    use crate::memory::{FixedPriceOracle, InMemoryAssetLedger, InMemoryShareToken, ManualClock};

    pub const ETH: Amount = 1_000_000_000_000_000_000;
    pub const USDT: Amount = 1_000_000;
    pub const START: Timestamp = 1_700_000_000;

    pub fn alice() -> AccountId {
        AccountId::from_low_u64(1)
    }

    pub fn bob() -> AccountId {
        AccountId::from_low_u64(2)
    }

    pub fn usd_per_eth(usd: Amount) -> Amount {
        usd * 100_000_000
    }

    /// Asset ledger whose next transfers can be made to fail
    #[derive(Clone)]
    pub struct FlakyLedger {
        inner: InMemoryAssetLedger,
        fail: Arc<AtomicBool>,
    }

    impl FlakyLedger {
        pub fn new(inner: InMemoryAssetLedger) -> (Self, Arc<AtomicBool>) {
            let fail = Arc::new(AtomicBool::new(false));
            (
                Self {
                    inner,
                    fail: fail.clone(),
                },
                fail,
            )
        }

        fn check(&self) -> std::result::Result<(), CollaboratorError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(CollaboratorError::TransferRejected {
                    asset: self.inner.symbol().to_string(),
                    reason: "injected failure".to_string(),
                });
            }
            Ok(())
        }
    }

    impl AssetLedger for FlakyLedger {
        fn symbol(&self) -> &str {
            self.inner.symbol()
        }

        fn transfer_in(
            &mut self,
            from: &AccountId,
            amount: Amount,
        ) -> std::result::Result<(), CollaboratorError> {
            self.check()?;
            self.inner.transfer_in(from, amount)
        }

        fn transfer_out(
            &mut self,
            to: &AccountId,
            amount: Amount,
        ) -> std::result::Result<(), CollaboratorError> {
            self.check()?;
            self.inner.transfer_out(to, amount)
        }

        fn balance_of(&self, account: &AccountId) -> Amount {
            self.inner.balance_of(account)
        }

        fn pool_balance(&self) -> Amount {
            self.inner.pool_balance()
        }
    }

    /// Share token that can be told to reject mints
    pub struct StubbornShares {
        inner: InMemoryShareToken,
        reject_mint: Arc<AtomicBool>,
    }

    impl ShareToken for StubbornShares {
        fn mint(
            &mut self,
            to: &AccountId,
            amount: Amount,
        ) -> std::result::Result<(), CollaboratorError> {
            if self.reject_mint.load(Ordering::SeqCst) {
                return Err(CollaboratorError::TokenRejected {
                    action: "mint".to_string(),
                    reason: "paused".to_string(),
                });
            }
            self.inner.mint(to, amount)
        }

        fn burn(
            &mut self,
            from: &AccountId,
            amount: Amount,
        ) -> std::result::Result<(), CollaboratorError> {
            self.inner.burn(from, amount)
        }

        fn balance_of(&self, account: &AccountId) -> Amount {
            self.inner.balance_of(account)
        }

        fn total_supply(&self) -> Amount {
            self.inner.total_supply()
        }
    }

    pub struct Harness {
        pub pool: LendingPool,
        pub oracle: FixedPriceOracle,
        pub clock: ManualClock,
        pub fail_native: Arc<AtomicBool>,
        pub fail_stable: Arc<AtomicBool>,
        pub reject_mint: Arc<AtomicBool>,
    }

    impl Harness {
        /// Pool at 2000 USD/ETH; alice and bob each hold 1000 ETH and
        /// 100_000 USDT, the pool holds 1_000_000 USDT to lend
        pub fn new() -> Self {
            Self::with_stable_reserve(1_000_000 * USDT)
        }

        pub fn with_stable_reserve(reserve: Amount) -> Self {
            let oracle = FixedPriceOracle::new(Quote {
                price: usd_per_eth(2_000),
                decimals: 8,
            });
            let clock = ManualClock::new(START);
            let (native, fail_native) = FlakyLedger::new(
                InMemoryAssetLedger::new("native")
                    .with_balance(alice(), 1_000 * ETH)
                    .with_balance(bob(), 1_000 * ETH),
            );
            let (stable, fail_stable) = FlakyLedger::new(
                InMemoryAssetLedger::new("stable")
                    .with_balance(alice(), 100_000 * USDT)
                    .with_balance(bob(), 100_000 * USDT)
                    .with_pool_balance(reserve),
            );
            let reject_mint = Arc::new(AtomicBool::new(false));
            let shares = StubbornShares {
                inner: InMemoryShareToken::new(),
                reject_mint: reject_mint.clone(),
            };

            let pool = LendingPool::new(
                RiskParameters::default(),
                Collaborators {
                    oracle: Box::new(oracle.clone()),
                    shares: Box::new(shares),
                    native: Box::new(native),
                    stable: Box::new(stable),
                    clock: Box::new(clock.clone()),
                },
            );

            Self {
                pool,
                oracle,
                clock,
                fail_native,
                fail_stable,
                reject_mint,
            }
        }

        pub fn set_usd_per_eth(&self, usd: Amount) {
            self.oracle.set_price(usd_per_eth(usd));
        }

        pub fn fail_native(&self, fail: bool) {
            self.fail_native.store(fail, Ordering::SeqCst);
        }

        pub fn fail_stable(&self, fail: bool) {
            self.fail_stable.store(fail, Ordering::SeqCst);
        }

        pub fn reject_mint(&self, reject: bool) {
            self.reject_mint.store(reject, Ordering::SeqCst);
        }
    }
}
