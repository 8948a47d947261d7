// o2ul/core/execution/src/state/state_db.rs

// State database managing balances and system-account storage
use crate::state::account::{AccountManager, AccountSnapshot};
use crate::state::ledger::{Ledger, LedgerError, SnapshotId, StateProvider};
use crate::types::{keccak256, Address, BalanceChangeReason, Hash, Word};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use primitive_types::U256;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// State root hash
pub type StateRoot = Hash;

/// State database managing all state
pub struct StateDB {
    /// Account manager
    pub accounts: Arc<AccountManager>,

    /// Word storage for each account
    storage: Arc<DashMap<Address, BTreeMap<Hash, Word>>>,

    /// Checkpoints handed out by `Ledger::snapshot`
    revisions: Mutex<Vec<StateSnapshot>>,

    /// Shared by every read and write; `restore` takes it exclusively
    gate: RwLock<()>,
}

impl StateDB {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(AccountManager::new()),
            storage: Arc::new(DashMap::new()),
            revisions: Mutex::new(Vec::new()),
            gate: RwLock::new(()),
        }
    }

    /// Get storage value; unset slots read as zero
    pub fn get_storage(&self, address: &Address, key: &Hash) -> Word {
        let _gate = self.gate.read();
        self.storage
            .get(address)
            .and_then(|slots| slots.get(key).copied())
            .unwrap_or(Word::ZERO)
    }

    /// Set storage value; writing zero clears the slot
    pub fn set_storage(&self, address: Address, key: Hash, value: Word) {
        let _gate = self.gate.read();
        if value.is_zero() {
            if let Some(mut slots) = self.storage.get_mut(&address) {
                slots.remove(&key);
            }
            return;
        }
        self.storage.entry(address).or_default().insert(key, value);
    }

    /// Number of non-zero slots held by an account
    pub fn storage_len(&self, address: &Address) -> usize {
        self.storage.get(address).map(|s| s.len()).unwrap_or(0)
    }

    /// Calculate state root over accounts and storage
    pub fn calculate_state_root(&self) -> StateRoot {
        let _gate = self.gate.read();
        let mut preimage = Vec::new();

        for (address, account) in self.accounts.all_accounts() {
            let mut balance = [0u8; 32];
            account.balance.to_big_endian(&mut balance);
            preimage.extend_from_slice(&address.0);
            preimage.extend_from_slice(&balance);
        }

        let mut owners: Vec<Address> = self.storage.iter().map(|e| *e.key()).collect();
        owners.sort();
        for owner in owners {
            if let Some(slots) = self.storage.get(&owner) {
                preimage.extend_from_slice(&owner.0);
                for (key, value) in slots.iter() {
                    preimage.extend_from_slice(key.as_bytes());
                    preimage.extend_from_slice(&value.0);
                }
            }
        }

        Hash::new(keccak256(&preimage))
    }

    /// Commit state changes
    pub fn commit(&self) -> StateRoot {
        let root = self.calculate_state_root();
        self.accounts.clear_dirty();
        self.revisions.lock().clear();
        debug!("State committed with root: {}", root);
        root
    }

    /// Create a full copy of the state
    pub fn copy_state(&self) -> StateSnapshot {
        let _gate = self.gate.read();
        StateSnapshot {
            accounts: self.accounts.snapshot(),
            storage: self
                .storage
                .iter()
                .map(|e| (*e.key(), e.value().clone()))
                .collect(),
        }
    }

    /// Restore from a copy. Readers see either the old or the restored state.
    pub fn restore(&self, snapshot: StateSnapshot) {
        let _gate = self.gate.write();
        self.accounts.restore(snapshot.accounts);

        self.storage.clear();
        for (addr, slots) in snapshot.storage {
            self.storage.insert(addr, slots);
        }

        debug!("State restored from snapshot");
    }
}

impl Default for StateDB {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger for StateDB {
    fn get_state(&self, account: &Address, key: &Hash) -> Result<Word, LedgerError> {
        Ok(self.get_storage(account, key))
    }

    fn set_state(&self, account: Address, key: Hash, value: Word) -> Result<(), LedgerError> {
        self.set_storage(account, key, value);
        Ok(())
    }

    fn get_balance(&self, account: &Address) -> Result<U256, LedgerError> {
        let _gate = self.gate.read();
        Ok(self.accounts.get_balance(account))
    }

    fn add_balance(
        &self,
        account: Address,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), LedgerError> {
        let _gate = self.gate.read();
        let balance = self.accounts.get_balance(&account);
        let updated = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { account })?;
        self.accounts.set_balance(account, updated);
        trace!(%account, %amount, %reason, "Balance credited");
        Ok(())
    }

    fn sub_balance(
        &self,
        account: Address,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), LedgerError> {
        let _gate = self.gate.read();
        let balance = self.accounts.get_balance(&account);
        let updated = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                account,
                balance,
                amount,
            })?;
        self.accounts.set_balance(account, updated);
        trace!(%account, %amount, %reason, "Balance debited");
        Ok(())
    }

    fn snapshot(&self) -> SnapshotId {
        let copy = self.copy_state();
        let mut revisions = self.revisions.lock();
        revisions.push(copy);
        revisions.len() - 1
    }

    fn revert_to_snapshot(&self, id: SnapshotId) -> Result<(), LedgerError> {
        let snapshot = {
            let mut revisions = self.revisions.lock();
            if id >= revisions.len() {
                return Err(LedgerError::InvalidSnapshot(id));
            }
            let snapshot = revisions.swap_remove(id);
            revisions.truncate(id);
            snapshot
        };
        self.restore(snapshot);
        Ok(())
    }

    fn discard_snapshot(&self, id: SnapshotId) {
        self.revisions.lock().truncate(id);
    }
}

impl StateProvider for Arc<StateDB> {
    fn latest_state(&self) -> Result<Arc<dyn Ledger>, LedgerError> {
        Ok(self.clone())
    }
}

/// State snapshot for rollback
#[derive(Clone)]
pub struct StateSnapshot {
    accounts: AccountSnapshot,
    storage: Vec<(Address, BTreeMap<Hash, Word>)>,
}
