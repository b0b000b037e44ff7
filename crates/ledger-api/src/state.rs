//! Application state shared across API handlers

use std::sync::Arc;

use ledger_core::{AppConfig, LedgerError};
use lending::LendingPool;
use thiserror::Error;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Errors that can occur while building the API state
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Invalid pool configuration: {0}")]
    Config(#[from] LedgerError),
}

/// Shared application state.
///
/// The pool sits behind one lock: mutations take it exclusively so every
/// operation sees the whole ledger without interleaving, reads share it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: RwLock<LendingPool>,
}

impl AppState {
    /// Build a pool with in-memory collaborators from config
    pub fn from_config(config: AppConfig) -> Result<Self, StateError> {
        let pool = LendingPool::from_config(&config)?;
        Ok(Self::with_pool(config, pool))
    }

    /// Wrap an already constructed pool
    pub fn with_pool(config: AppConfig, pool: LendingPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool: RwLock::new(pool),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Shared access for reads
    pub async fn pool(&self) -> RwLockReadGuard<'_, LendingPool> {
        self.inner.pool.read().await
    }

    /// Exclusive access for mutations
    pub async fn pool_mut(&self) -> RwLockWriteGuard<'_, LendingPool> {
        self.inner.pool.write().await
    }
}
