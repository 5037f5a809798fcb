//! Owner registry
//!
//! Holds the authorized owner set and the approval threshold. Owners are
//! kept in traversal order (newest first, initial owners in the order they
//! were provisioned). Each owner is stamped with an insertion sequence:
//! the ordered map gives the traversal, the identity index gives O(1)
//! membership, and a removal only needs to look at the neighbouring entry
//! to validate the caller-supplied predecessor.

use crate::crypto::Address;
use crate::multisig::wallet::MultisigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound::{Excluded, Unbounded};

/// Serialized form: owners in traversal order plus the threshold
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RegistryRecord {
    owners: Vec<Address>,
    threshold: usize,
}

/// The set of authorized owners and the approval threshold
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RegistryRecord", into = "RegistryRecord")]
pub struct OwnerRegistry {
    /// Insertion sequence -> owner; traversal walks from the highest sequence down
    slots: BTreeMap<u64, Address>,
    /// Owner -> insertion sequence
    index: HashMap<Address, u64>,
    /// Sequence handed to the next added owner
    next_seq: u64,
    /// Approvals required to execute an action
    threshold: usize,
}

impl OwnerRegistry {
    /// Set up the registry from the provisioned owners and threshold
    ///
    /// `engine` is the identity of the wallet the registry belongs to; it can
    /// never be one of its own owners.
    pub fn new(owners: &[Address], threshold: usize, engine: Address) -> Result<Self, MultisigError> {
        if owners.is_empty() {
            return Err(MultisigError::InvalidInput(
                "at least one owner is required".to_string(),
            ));
        }
        if threshold == 0 || threshold > owners.len() {
            return Err(MultisigError::InvalidInput(format!(
                "threshold {} must be between 1 and {}",
                threshold,
                owners.len()
            )));
        }

        let mut registry = Self {
            slots: BTreeMap::new(),
            index: HashMap::new(),
            next_seq: 0,
            threshold,
        };

        // Insert in reverse so the first provisioned owner heads the traversal
        for owner in owners.iter().rev() {
            registry.insert(*owner, engine)?;
        }

        Ok(registry)
    }

    /// Check if an identity is a current owner
    pub fn is_owner(&self, identity: &Address) -> bool {
        self.index.contains_key(identity)
    }

    /// Owners in traversal order
    pub fn owners(&self) -> Vec<Address> {
        self.slots.values().rev().copied().collect()
    }

    /// Number of owners
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Approvals required to execute an action
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// The traversal predecessor of an owner (`SENTINEL` for the head)
    pub fn predecessor_of(&self, owner: &Address) -> Option<Address> {
        let seq = *self.index.get(owner)?;
        Some(
            self.slots
                .range((Excluded(seq), Unbounded))
                .next()
                .map(|(_, prev)| *prev)
                .unwrap_or(Address::SENTINEL),
        )
    }

    /// Add an owner at the head of the traversal; the threshold is unchanged
    pub(crate) fn add_owner(&mut self, owner: Address, engine: Address) -> Result<(), MultisigError> {
        self.insert(owner, engine)
    }

    /// Remove `owner`, given its traversal predecessor `prev_owner`
    pub(crate) fn remove_owner(
        &mut self,
        prev_owner: Address,
        owner: Address,
    ) -> Result<(), MultisigError> {
        if self.len() - 1 < self.threshold {
            return Err(MultisigError::ThresholdUnreachable {
                owners: self.len() - 1,
                threshold: self.threshold,
            });
        }

        if owner.is_zero() || owner == Address::SENTINEL {
            return Err(MultisigError::InvalidOwner(owner));
        }

        match self.predecessor_of(&owner) {
            Some(actual) if actual == prev_owner => {}
            _ => return Err(MultisigError::InvalidOwner(owner)),
        }

        if let Some(seq) = self.index.remove(&owner) {
            self.slots.remove(&seq);
        }

        Ok(())
    }

    /// Change the number of approvals required
    pub(crate) fn change_threshold(&mut self, threshold: usize) -> Result<(), MultisigError> {
        if threshold == 0 || threshold > self.len() {
            return Err(MultisigError::InvalidInput(format!(
                "threshold {} must be between 1 and {}",
                threshold,
                self.len()
            )));
        }

        self.threshold = threshold;
        Ok(())
    }

    fn insert(&mut self, owner: Address, engine: Address) -> Result<(), MultisigError> {
        if owner.is_zero()
            || owner == Address::SENTINEL
            || owner == engine
            || self.index.contains_key(&owner)
        {
            return Err(MultisigError::InvalidOwner(owner));
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.insert(seq, owner);
        self.index.insert(owner, seq);
        Ok(())
    }
}

impl TryFrom<RegistryRecord> for OwnerRegistry {
    type Error = MultisigError;

    fn try_from(record: RegistryRecord) -> Result<Self, Self::Error> {
        // The engine identity is re-checked by the wallet state on load
        Self::new(&record.owners, record.threshold, Address::ZERO)
    }
}

impl From<OwnerRegistry> for RegistryRecord {
    fn from(registry: OwnerRegistry) -> Self {
        RegistryRecord {
            owners: registry.owners(),
            threshold: registry.threshold,
        }
    }
}
