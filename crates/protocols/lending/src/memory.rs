//! In-memory collaborators
//!
//! Deterministic implementations of the capability traits, used by the
//! standalone service and by tests. The oracle and clock are cheap handles
//! over shared state so a caller can keep a clone and move the price or the
//! time after handing the original to a pool.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use ledger_core::{AccountId, Amount, AppConfig, CollaboratorError, Timestamp};

use crate::calculator::Quote;
use crate::capabilities::{AssetLedger, Clock, Collaborators, PriceOracle, ShareToken};
use crate::constants::assets;

// =============================================================================
// Share token
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct InMemoryShareToken {
    balances: HashMap<AccountId, Amount>,
    total_supply: Amount,
}

impl InMemoryShareToken {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShareToken for InMemoryShareToken {
    fn mint(&mut self, to: &AccountId, amount: Amount) -> Result<(), CollaboratorError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| rejected("mint", "total supply overflow"))?;
        let balance = self.balance_of(to);
        let balance = balance
            .checked_add(amount)
            .ok_or_else(|| rejected("mint", "balance overflow"))?;

        self.balances.insert(*to, balance);
        self.total_supply = supply;
        Ok(())
    }

    fn burn(&mut self, from: &AccountId, amount: Amount) -> Result<(), CollaboratorError> {
        let balance = self.balance_of(from);
        let remaining = balance.checked_sub(amount).ok_or_else(|| {
            rejected(
                "burn",
                &format!("balance {} is below {}", balance, amount),
            )
        })?;

        self.balances.insert(*from, remaining);
        self.total_supply -= amount;
        Ok(())
    }

    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> Amount {
        self.total_supply
    }
}

fn rejected(action: &str, reason: &str) -> CollaboratorError {
    CollaboratorError::TokenRejected {
        action: action.to_string(),
        reason: reason.to_string(),
    }
}

// =============================================================================
// Asset ledger
// =============================================================================

/// How external wallets are funded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Funding {
    /// Wallets hold exactly what they were seeded with or received
    Tracked,
    /// Wallets can always pay; their balance only reflects what the pool sent them
    Open,
}

#[derive(Debug, Clone)]
pub struct InMemoryAssetLedger {
    symbol: String,
    funding: Funding,
    balances: HashMap<AccountId, Amount>,
    pool_balance: Amount,
}

impl InMemoryAssetLedger {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            funding: Funding::Tracked,
            balances: HashMap::new(),
            pool_balance: 0,
        }
    }

    pub fn open(symbol: impl Into<String>) -> Self {
        Self {
            funding: Funding::Open,
            ..Self::new(symbol)
        }
    }

    pub fn with_balance(mut self, account: AccountId, amount: Amount) -> Self {
        self.balances.insert(account, amount);
        self
    }

    pub fn with_pool_balance(mut self, amount: Amount) -> Self {
        self.pool_balance = amount;
        self
    }

    pub fn funding(&self) -> Funding {
        self.funding
    }

    fn transfer_error(&self, reason: String) -> CollaboratorError {
        CollaboratorError::TransferRejected {
            asset: self.symbol.clone(),
            reason,
        }
    }
}

impl AssetLedger for InMemoryAssetLedger {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn transfer_in(&mut self, from: &AccountId, amount: Amount) -> Result<(), CollaboratorError> {
        let wallet = self.balance_of(from);
        let remaining = match self.funding {
            Funding::Tracked => wallet.checked_sub(amount).ok_or_else(|| {
                self.transfer_error(format!(
                    "{} holds {}, cannot send {}",
                    from, wallet, amount
                ))
            })?,
            Funding::Open => wallet.saturating_sub(amount),
        };
        let pool_balance = self
            .pool_balance
            .checked_add(amount)
            .ok_or_else(|| self.transfer_error("pool balance overflow".to_string()))?;

        self.balances.insert(*from, remaining);
        self.pool_balance = pool_balance;
        Ok(())
    }

    fn transfer_out(&mut self, to: &AccountId, amount: Amount) -> Result<(), CollaboratorError> {
        let pool_balance = self.pool_balance.checked_sub(amount).ok_or_else(|| {
            self.transfer_error(format!(
                "pool holds {}, cannot pay {}",
                self.pool_balance, amount
            ))
        })?;
        let wallet = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| self.transfer_error(format!("{} balance overflow", to)))?;

        self.balances.insert(*to, wallet);
        self.pool_balance = pool_balance;
        Ok(())
    }

    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn pool_balance(&self) -> Amount {
        self.pool_balance
    }
}

// =============================================================================
// Oracle
// =============================================================================

/// Oracle answering with a settable quote; `None` means unavailable
#[derive(Debug, Clone)]
pub struct FixedPriceOracle {
    quote: Arc<RwLock<Option<Quote>>>,
}

impl FixedPriceOracle {
    pub fn new(quote: Quote) -> Self {
        Self {
            quote: Arc::new(RwLock::new(Some(quote))),
        }
    }

    pub fn set_quote(&self, quote: Option<Quote>) {
        if let Ok(mut guard) = self.quote.write() {
            *guard = quote;
        }
    }

    /// Change the price, keeping the current decimals
    pub fn set_price(&self, price: Amount) {
        if let Ok(mut guard) = self.quote.write() {
            if let Some(quote) = guard.as_mut() {
                quote.price = price;
            }
        }
    }
}

impl PriceOracle for FixedPriceOracle {
    fn quote(&self) -> Result<Quote, CollaboratorError> {
        let guard = self
            .quote
            .read()
            .map_err(|_| CollaboratorError::OracleUnavailable {
                reason: "quote lock poisoned".to_string(),
            })?;
        let quote = (*guard).ok_or_else(|| CollaboratorError::OracleUnavailable {
            reason: "no quote published".to_string(),
        })?;
        if quote.price == 0 {
            return Err(CollaboratorError::InvalidQuote {
                reason: "price is zero".to_string(),
            });
        }
        Ok(quote)
    }
}

// =============================================================================
// Clocks
// =============================================================================

/// Wall-clock seconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Wiring
// =============================================================================

impl Collaborators {
    /// Standalone collaborators: open-funded wallets, the configured stable
    /// reserve, a fixed oracle price, and wall-clock time
    pub fn in_memory(config: &AppConfig) -> Self {
        Self {
            oracle: Box::new(FixedPriceOracle::new(Quote {
                price: config.oracle.price,
                decimals: config.oracle.decimals,
            })),
            shares: Box::new(InMemoryShareToken::new()),
            native: Box::new(InMemoryAssetLedger::open(assets::NATIVE)),
            stable: Box::new(
                InMemoryAssetLedger::open(assets::STABLE)
                    .with_pool_balance(config.assets.stable_reserve),
            ),
            clock: Box::new(SystemClock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::from_low_u64(1)
    }

    #[test]
    fn test_share_token_mint_and_burn() {
        let mut token = InMemoryShareToken::new();
        token.mint(&alice(), 10).unwrap();
        token.burn(&alice(), 4).unwrap();
        assert_eq!(token.balance_of(&alice()), 6);
        assert_eq!(token.total_supply(), 6);

        let err = token.burn(&alice(), 7).unwrap_err();
        assert!(matches!(err, CollaboratorError::TokenRejected { .. }));
        assert_eq!(token.total_supply(), 6);
    }

    #[test]
    fn test_tracked_ledger_rejects_overdraft() {
        let mut ledger = InMemoryAssetLedger::new("native").with_balance(alice(), 5);
        ledger.transfer_in(&alice(), 3).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 2);
        assert_eq!(ledger.pool_balance(), 3);

        let err = ledger.transfer_in(&alice(), 3).unwrap_err();
        assert!(err.to_string().starts_with("native transfer rejected"));

        let err = ledger.transfer_out(&alice(), 4).unwrap_err();
        assert!(matches!(err, CollaboratorError::TransferRejected { .. }));
        assert_eq!(ledger.pool_balance(), 3);
    }

    #[test]
    fn test_open_ledger_accepts_any_payer() {
        let mut ledger = InMemoryAssetLedger::open("native");
        ledger.transfer_in(&alice(), 100).unwrap();
        assert_eq!(ledger.pool_balance(), 100);
        assert_eq!(ledger.balance_of(&alice()), 0);
        assert_eq!(ledger.funding(), Funding::Open);
    }

    #[test]
    fn test_oracle_handle_shares_price() {
        let oracle = FixedPriceOracle::new(Quote {
            price: 2_000,
            decimals: 0,
        });
        let handle = oracle.clone();
        handle.set_price(1_500);
        assert_eq!(oracle.quote().unwrap().price, 1_500);

        handle.set_quote(None);
        assert!(matches!(
            oracle.quote().unwrap_err(),
            CollaboratorError::OracleUnavailable { .. }
        ));
    }

    #[test]
    fn test_oracle_rejects_zero_price() {
        let oracle = FixedPriceOracle::new(Quote {
            price: 0,
            decimals: 8,
        });
        assert!(matches!(
            oracle.quote().unwrap_err(),
            CollaboratorError::InvalidQuote { .. }
        ));
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        let handle = clock.clone();
        handle.advance(50);
        assert_eq!(clock.now(), 150);
        handle.set(10);
        assert_eq!(clock.now(), 10);
        assert!(SystemClock.now() > 0);
    }
}
