//! Pool events
//!
//! Every committed mutation appends exactly one event. The log is append-only
//! and sequence numbers start at 1.

use ledger_core::{AccountId, Amount, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PoolEvent {
    Deposited {
        account: AccountId,
        #[serde(with = "ledger_core::amount_string")]
        amount: Amount,
        #[serde(with = "ledger_core::amount_string")]
        shares_minted: Amount,
    },
    DepositWithdrawn {
        account: AccountId,
        #[serde(with = "ledger_core::amount_string")]
        total_payout: Amount,
        #[serde(with = "ledger_core::amount_string")]
        shares_burned: Amount,
    },
    CollateralDeposited {
        account: AccountId,
        #[serde(with = "ledger_core::amount_string")]
        amount: Amount,
    },
    CollateralWithdrawn {
        account: AccountId,
        #[serde(with = "ledger_core::amount_string")]
        amount: Amount,
    },
    LoanBorrowed {
        account: AccountId,
        #[serde(with = "ledger_core::amount_string")]
        amount: Amount,
        /// Borrowed amount valued in native units at the borrow-time quote
        #[serde(with = "ledger_core::amount_string")]
        native_value: Amount,
    },
    LoanRepaid {
        account: AccountId,
        #[serde(with = "ledger_core::amount_string")]
        amount: Amount,
        #[serde(with = "ledger_core::amount_string")]
        interest_paid: Amount,
    },
}

impl PoolEvent {
    pub fn account(&self) -> &AccountId {
        match self {
            Self::Deposited { account, .. }
            | Self::DepositWithdrawn { account, .. }
            | Self::CollateralDeposited { account, .. }
            | Self::CollateralWithdrawn { account, .. }
            | Self::LoanBorrowed { account, .. }
            | Self::LoanRepaid { account, .. } => account,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Deposited { .. } => "Deposited",
            Self::DepositWithdrawn { .. } => "DepositWithdrawn",
            Self::CollateralDeposited { .. } => "CollateralDeposited",
            Self::CollateralWithdrawn { .. } => "CollateralWithdrawn",
            Self::LoanBorrowed { .. } => "LoanBorrowed",
            Self::LoanRepaid { .. } => "LoanRepaid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub timestamp: Timestamp,
    pub event: PoolEvent,
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, timestamp: Timestamp, event: PoolEvent) -> &EventRecord {
        let sequence = self.records.len() as u64 + 1;
        self.records.push(EventRecord {
            sequence,
            timestamp,
            event,
        });
        &self.records[self.records.len() - 1]
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with a sequence number greater than `sequence`
    pub fn since(&self, sequence: u64) -> &[EventRecord] {
        let start = (sequence as usize).min(self.records.len());
        &self.records[start..]
    }

    pub fn last(&self) -> Option<&EventRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
