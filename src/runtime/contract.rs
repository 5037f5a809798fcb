//! Callable account logic
//!
//! Accounts with registered logic can be the target of an action, and can act
//! as owners that validate attestations themselves.

use crate::crypto::{Address, Hash32};
use crate::multisig::wallet::{MultisigError, WalletState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Value a contract owner returns from `is_valid_signature` to accept a digest
/// (`isValidSignature(bytes32,bytes)` selector)
pub const MAGIC_VALUE: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

/// Errors raised while running account logic
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("Call reverted: {0}")]
    Reverted(String),
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: u128, required: u128 },
    #[error("Operation not supported by the target")]
    Unsupported,
    #[error("Wallet error: {0}")]
    Wallet(#[from] MultisigError),
}

/// Key/value storage of one account
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Storage {
    slots: BTreeMap<String, u128>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a slot; unset slots read as zero
    pub fn get(&self, key: &str) -> u128 {
        self.slots.get(key).copied().unwrap_or(0)
    }

    /// Write a slot; writing zero clears it
    pub fn set(&mut self, key: &str, value: u128) {
        if value == 0 {
            self.slots.remove(key);
        } else {
            self.slots.insert(key.to_string(), value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &u128)> {
        self.slots.iter()
    }
}

/// Execution context handed to account logic
///
/// For an isolated call `this` is the callee and `storage` is the callee's.
/// For a delegated call `this` is the wallet, `storage` is the wallet's and
/// the frame also exposes the wallet state.
pub struct Frame<'a> {
    /// Account that issued the call
    pub caller: Address,
    /// Identity the logic runs as
    pub this: Address,
    /// Value attached to the call
    pub value: u128,
    storage: &'a mut Storage,
    wallet: Option<&'a mut WalletState>,
}

impl<'a> Frame<'a> {
    /// Frame for an isolated call
    pub(crate) fn isolated(caller: Address, this: Address, value: u128, storage: &'a mut Storage) -> Self {
        Self {
            caller,
            this,
            value,
            storage,
            wallet: None,
        }
    }

    /// Frame for logic running with the wallet's identity
    pub(crate) fn delegated(
        caller: Address,
        storage: &'a mut Storage,
        wallet: &'a mut WalletState,
    ) -> Self {
        Self {
            caller,
            this: wallet.address(),
            value: 0,
            storage,
            wallet: Some(wallet),
        }
    }

    pub fn storage(&self) -> &Storage {
        &*self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut *self.storage
    }

    pub fn is_delegated(&self) -> bool {
        self.wallet.is_some()
    }

    /// Wallet state, visible only inside a delegated call
    pub fn wallet(&self) -> Option<&WalletState> {
        self.wallet.as_deref()
    }

    fn delegated_wallet(&mut self) -> Result<&mut WalletState, CallError> {
        self.wallet.as_deref_mut().ok_or(CallError::Unsupported)
    }

    /// Add an owner on behalf of the wallet; delegated calls only
    pub fn add_owner(&mut self, owner: Address) -> Result<(), CallError> {
        Ok(self.delegated_wallet()?.add_owner(owner)?)
    }

    /// Remove an owner on behalf of the wallet; delegated calls only
    pub fn remove_owner(&mut self, prev_owner: Address, owner: Address) -> Result<(), CallError> {
        Ok(self.delegated_wallet()?.remove_owner(prev_owner, owner)?)
    }

    /// Change the threshold on behalf of the wallet; delegated calls only
    pub fn change_threshold(&mut self, threshold: usize) -> Result<(), CallError> {
        Ok(self.delegated_wallet()?.change_threshold(threshold)?)
    }

    /// Spend the wallet's current nonce; delegated calls only
    pub fn advance_nonce(&mut self) -> Result<u64, CallError> {
        Ok(self.delegated_wallet()?.advance_nonce())
    }
}

/// Logic registered at an address
pub trait Contract: Send + Sync {
    /// Run the logic for `payload`
    fn call(&self, frame: &mut Frame<'_>, payload: &[u8]) -> Result<Vec<u8>, CallError>;

    /// Decide whether this account approves `digest`
    ///
    /// Returning [`MAGIC_VALUE`] accepts. Accounts that cannot validate
    /// attestations keep the default.
    fn is_valid_signature(
        &self,
        _storage: &Storage,
        _digest: &Hash32,
        _payload: &[u8],
    ) -> Result<[u8; 4], CallError> {
        Err(CallError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::selector;
    use crate::multisig::WalletConfig;

    #[test]
    fn test_magic_value_is_selector() {
        assert_eq!(MAGIC_VALUE, selector("isValidSignature(bytes32,bytes)"));
    }

    #[test]
    fn test_storage_zero_clears() {
        let mut storage = Storage::new();
        assert_eq!(storage.get("count"), 0);

        storage.set("count", 5);
        assert_eq!(storage.get("count"), 5);

        storage.set("count", 0);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_isolated_frame_has_no_wallet() {
        let mut storage = Storage::new();
        let mut frame = Frame::isolated(Address::SENTINEL, Address::ZERO, 0, &mut storage);
        assert!(!frame.is_delegated());
        assert!(frame.wallet().is_none());
        assert_eq!(frame.add_owner(Address::SENTINEL), Err(CallError::Unsupported));
        assert_eq!(frame.change_threshold(1), Err(CallError::Unsupported));
        assert_eq!(frame.advance_nonce(), Err(CallError::Unsupported));

        frame.storage_mut().set("k", 1);
        assert_eq!(frame.storage().get("k"), 1);
    }

    #[test]
    fn test_delegated_frame_mutates_wallet() {
        let owner = Address::new([1u8; 20]);
        let config = WalletConfig::new(Address::new([0xee; 20]), 1, vec![owner], 1).unwrap();
        let mut state = WalletState::new(&config).unwrap();
        let mut storage = Storage::new();

        let mut frame = Frame::delegated(owner, &mut storage, &mut state);
        assert_eq!(frame.this, Address::new([0xee; 20]));
        frame.add_owner(Address::new([2u8; 20])).unwrap();
        frame.change_threshold(2).unwrap();
        assert_eq!(frame.advance_nonce(), Ok(0));
        assert!(matches!(
            frame.remove_owner(Address::SENTINEL, Address::new([2u8; 20])),
            Err(CallError::Wallet(MultisigError::ThresholdUnreachable { .. }))
        ));
        assert_eq!(frame.wallet().map(|w| w.nonce()), Some(1));

        assert_eq!(state.registry().threshold(), 2);
        assert!(state.registry().is_owner(&Address::new([2u8; 20])));
    }
}
