//! Lending Pool Accounting Engine
//!
//! Bookkeeping for a collateralized lending pool: depositors supply a native
//! asset and receive pool shares, borrowers post native collateral and borrow
//! a stable asset priced through an external oracle.
//!
//! # Architecture
//!
//! [`LendingPool`] is a single owned aggregate. Pricing, share bookkeeping,
//! asset custody, and time are injected through the traits in
//! [`capabilities`]; [`memory`] provides in-process implementations.
//!
//! Each mutating operation validates and stages its ledger changes, performs
//! external effects last, and commits only when they all succeed. Callers that
//! share a pool across threads must serialize mutations behind one lock.

pub mod calculator;
pub mod capabilities;
pub mod constants;
pub mod credit;
pub mod events;
pub mod liquidation;
pub mod liquidity;
pub mod memory;
pub mod pool;
pub mod risk;
pub mod state;

// Re-exports
pub use calculator::{AssetDecimals, Quote, RateCurve, Rounding};
pub use capabilities::*;
pub use events::*;
pub use liquidation::PositionHealth;
pub use memory::*;
pub use pool::LendingPool;
pub use risk::RiskParameters;
pub use state::*;
