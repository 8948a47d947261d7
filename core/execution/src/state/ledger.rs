// o2ul/core/execution/src/state/ledger.rs

use crate::types::{Address, BalanceChangeReason, Hash, Word};
use primitive_types::U256;
use std::sync::Arc;

/// Identifier of a ledger checkpoint returned by [`Ledger::snapshot`]
pub type SnapshotId = usize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("state unavailable: {0}")]
    Unavailable(String),

    #[error("insufficient balance in {account}: have {balance}, need {amount}")]
    InsufficientBalance {
        account: Address,
        balance: U256,
        amount: U256,
    },

    #[error("balance overflow for {account}")]
    BalanceOverflow { account: Address },

    #[error("invalid snapshot id {0}")]
    InvalidSnapshot(SnapshotId),
}

/// Account-keyed word storage plus a native balance ledger.
///
/// Every call on one handle observes and mutates the same state. Callers that
/// need all-or-nothing semantics take a [`Ledger::snapshot`] before mutating
/// and [`Ledger::revert_to_snapshot`] on failure.
pub trait Ledger: Send + Sync {
    fn get_state(&self, account: &Address, key: &Hash) -> Result<Word, LedgerError>;

    fn set_state(&self, account: Address, key: Hash, value: Word) -> Result<(), LedgerError>;

    fn get_balance(&self, account: &Address) -> Result<U256, LedgerError>;

    fn add_balance(
        &self,
        account: Address,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), LedgerError>;

    fn sub_balance(
        &self,
        account: Address,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), LedgerError>;

    fn snapshot(&self) -> SnapshotId;

    fn revert_to_snapshot(&self, id: SnapshotId) -> Result<(), LedgerError>;

    /// Drop checkpoint `id` and every later one, keeping current state
    fn discard_snapshot(&self, id: SnapshotId);
}

/// Source of the current chain state
pub trait StateProvider: Send + Sync {
    fn latest_state(&self) -> Result<Arc<dyn Ledger>, LedgerError>;
}
