//! Account state outside the wallet's own bookkeeping

use crate::crypto::Address;
use crate::runtime::contract::{CallError, Contract, Storage};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Balances, storage and registered logic of every account
///
/// Cloning is cheap for the logic (shared `Arc`s), so a clone is a full
/// snapshot that can be put back after a failed call.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct World {
    balances: BTreeMap<Address, u128>,
    storage: BTreeMap<Address, Storage>,
    /// Logic is registered in-process and never persisted
    #[serde(skip)]
    contracts: HashMap<Address, Arc<dyn Contract>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Mint `amount` into an account
    pub fn deposit(&mut self, account: Address, amount: u128) -> Result<u128, CallError> {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| CallError::Reverted("balance overflow".to_string()))?;
        Ok(*balance)
    }

    /// Move value between accounts
    pub fn transfer(&mut self, from: Address, to: Address, amount: u128) -> Result<(), CallError> {
        if amount == 0 || from == to {
            return Ok(());
        }

        let available = self.balance_of(&from);
        if available < amount {
            return Err(CallError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        let credited = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or_else(|| CallError::Reverted("balance overflow".to_string()))?;

        self.balances.insert(from, available - amount);
        self.balances.insert(to, credited);
        Ok(())
    }

    pub fn storage(&self, account: &Address) -> Option<&Storage> {
        self.storage.get(account)
    }

    /// Storage of an account, created empty on first use
    pub fn storage_mut(&mut self, account: Address) -> &mut Storage {
        self.storage.entry(account).or_default()
    }

    /// Register logic at an address, replacing any previous logic
    pub fn register(&mut self, account: Address, contract: Arc<dyn Contract>) {
        log::debug!("Registered logic at {}", account);
        self.contracts.insert(account, contract);
    }

    pub fn contract(&self, account: &Address) -> Option<Arc<dyn Contract>> {
        self.contracts.get(account).cloned()
    }

    pub fn has_code(&self, account: &Address) -> bool {
        self.contracts.contains_key(account)
    }

    /// Accounts holding a non-zero balance
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.balances.iter().filter(|(_, balance)| **balance > 0)
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut contracts: Vec<&Address> = self.contracts.keys().collect();
        contracts.sort();
        f.debug_struct("World")
            .field("balances", &self.balances)
            .field("storage", &self.storage)
            .field("contracts", &contracts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::contract::Frame;

    struct Echo;

    impl Contract for Echo {
        fn call(&self, _frame: &mut Frame<'_>, payload: &[u8]) -> Result<Vec<u8>, CallError> {
            Ok(payload.to_vec())
        }
    }

    fn account(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn test_deposit_and_transfer() {
        let mut world = World::new();
        world.deposit(account(1), 100).unwrap();

        world.transfer(account(1), account(2), 40).unwrap();
        assert_eq!(world.balance_of(&account(1)), 60);
        assert_eq!(world.balance_of(&account(2)), 40);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut world = World::new();
        world.deposit(account(1), 10).unwrap();

        assert_eq!(
            world.transfer(account(1), account(2), 11),
            Err(CallError::InsufficientBalance {
                available: 10,
                required: 11
            })
        );
        assert_eq!(world.balance_of(&account(1)), 10);
        assert_eq!(world.balance_of(&account(2)), 0);
    }

    #[test]
    fn test_zero_and_self_transfers_are_noops() {
        let mut world = World::new();
        world.transfer(account(1), account(2), 0).unwrap();
        world.deposit(account(1), 5).unwrap();
        world.transfer(account(1), account(1), 5).unwrap();
        assert_eq!(world.balance_of(&account(1)), 5);
    }

    #[test]
    fn test_clone_restores_state() {
        let mut world = World::new();
        world.register(account(9), Arc::new(Echo));
        world.storage_mut(account(9)).set("x", 1);
        let snapshot = world.clone();

        world.storage_mut(account(9)).set("x", 2);
        world.deposit(account(1), 7).unwrap();

        world = snapshot;
        assert_eq!(world.storage(&account(9)).unwrap().get("x"), 1);
        assert_eq!(world.balance_of(&account(1)), 0);
        assert!(world.has_code(&account(9)));
    }

    #[test]
    fn test_logic_is_not_persisted() {
        let mut world = World::new();
        world.register(account(9), Arc::new(Echo));
        world.deposit(account(1), 3).unwrap();

        let json = serde_json::to_string(&world).unwrap();
        let restored: World = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.balance_of(&account(1)), 3);
        assert!(!restored.has_code(&account(9)));
    }
}
