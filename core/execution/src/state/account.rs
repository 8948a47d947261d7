// o2ul/core/execution/src/state/account.rs

use crate::types::Address;
use dashmap::{DashMap, DashSet};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Per-account native state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub balance: U256,
}

/// Account manager tracking balances and which accounts changed since the
/// last commit.
#[derive(Default)]
pub struct AccountManager {
    accounts: DashMap<Address, AccountState>,
    dirty: DashSet<Address>,
}

impl AccountManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_balance(&self, address: &Address) -> U256 {
        self.accounts
            .get(address)
            .map(|a| a.balance)
            .unwrap_or_default()
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.accounts.entry(address).or_default().balance = balance;
        self.dirty.insert(address);
    }

    pub fn get_dirty_accounts(&self) -> Vec<Address> {
        self.dirty.iter().map(|a| *a).collect()
    }

    pub fn clear_dirty(&self) {
        self.dirty.clear();
    }

    /// All accounts, sorted by address
    pub fn all_accounts(&self) -> Vec<(Address, AccountState)> {
        let mut accounts: Vec<_> = self
            .accounts
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        accounts.sort_by(|a, b| a.0.cmp(&b.0));
        accounts
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            accounts: self.all_accounts(),
        }
    }

    pub fn restore(&self, snapshot: AccountSnapshot) {
        self.accounts.clear();
        for (address, account) in snapshot.accounts {
            self.accounts.insert(address, account);
            self.dirty.insert(address);
        }
    }
}

/// Point-in-time copy of all accounts
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    accounts: Vec<(Address, AccountState)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balances_and_dirty_tracking() {
        let manager = AccountManager::new();
        let alice = Address([1; 20]);

        assert_eq!(manager.get_balance(&alice), U256::zero());
        manager.set_balance(alice, U256::from(500));

        assert_eq!(manager.get_balance(&alice), U256::from(500));
        assert_eq!(manager.get_dirty_accounts(), vec![alice]);

        manager.clear_dirty();
        assert!(manager.get_dirty_accounts().is_empty());
    }

    #[test]
    fn test_restore_drops_accounts_created_after_snapshot() {
        let manager = AccountManager::new();
        let alice = Address([1; 20]);
        let bob = Address([2; 20]);

        manager.set_balance(alice, U256::from(10));
        let snapshot = manager.snapshot();
        manager.set_balance(bob, U256::from(20));

        manager.restore(snapshot);
        assert_eq!(manager.get_balance(&alice), U256::from(10));
        assert_eq!(manager.get_balance(&bob), U256::zero());
        assert_eq!(manager.all_accounts().len(), 1);
    }
}
