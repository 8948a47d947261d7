// o2ul/core/execution/src/state/mod.rs

// State management module
// Handles account balances, system-account storage and snapshots

pub mod account;
pub mod ledger;
pub mod state_db;

pub use account::{AccountManager, AccountSnapshot, AccountState};
pub use ledger::{Ledger, LedgerError, SnapshotId, StateProvider};
pub use state_db::{StateDB, StateRoot, StateSnapshot};
