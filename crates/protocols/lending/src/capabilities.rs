//! External collaborators consumed by the pool
//!
//! The engine never implements pricing, token bookkeeping, or asset custody
//! itself; it calls these capabilities. Implementations must be exact-integer
//! and either complete an effect fully or return an error without effect.

use ledger_core::{AccountId, Amount, CollaboratorError, Timestamp};

use crate::calculator::Quote;

/// Current native/stable exchange rate. Staleness and aggregation are the
/// oracle's concern; every quote is treated as fresh.
pub trait PriceOracle: Send + Sync {
    fn quote(&self) -> Result<Quote, CollaboratorError>;
}

/// Mintable, burnable pool-share token
pub trait ShareToken: Send + Sync {
    fn mint(&mut self, to: &AccountId, amount: Amount) -> Result<(), CollaboratorError>;
    fn burn(&mut self, from: &AccountId, amount: Amount) -> Result<(), CollaboratorError>;
    fn balance_of(&self, account: &AccountId) -> Amount;
    fn total_supply(&self) -> Amount;
}

/// Custody of one asset on behalf of the pool
pub trait AssetLedger: Send + Sync {
    /// Label used in logs and errors
    fn symbol(&self) -> &str;

    /// Move `amount` from `from` into pool custody
    fn transfer_in(&mut self, from: &AccountId, amount: Amount) -> Result<(), CollaboratorError>;

    /// Move `amount` out of pool custody to `to`
    fn transfer_out(&mut self, to: &AccountId, amount: Amount) -> Result<(), CollaboratorError>;

    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Amount currently held by the pool
    fn pool_balance(&self) -> Amount;
}

/// Source of the current time in seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Everything the pool calls out to
pub struct Collaborators {
    pub oracle: Box<dyn PriceOracle>,
    pub shares: Box<dyn ShareToken>,
    pub native: Box<dyn AssetLedger>,
    pub stable: Box<dyn AssetLedger>,
    pub clock: Box<dyn Clock>,
}
