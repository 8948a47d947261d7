// o2ul/core/execution/src/lib.rs

// Re-export modules
pub mod state;
pub mod types;

pub use types::{Address, BalanceChangeReason, Hash, Word, WordError};

pub use state::{
    AccountManager, AccountState, Ledger, LedgerError, SnapshotId, StateDB, StateProvider,
    StateRoot,
};
