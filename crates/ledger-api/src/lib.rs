//! ledger-api: HTTP API layer for the lending pool
//!
//! Exposes pool reads and the mutating operations as JSON endpoints. All
//! amounts travel as decimal strings.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::{AppState, StateError};
