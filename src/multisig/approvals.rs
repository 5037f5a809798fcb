//! Pre-approved hash store
//!
//! Owners can approve a digest out-of-band; a bundle may then reference the
//! approval instead of carrying a signature. Entries are never cleared.

use crate::crypto::{Address, Hash32};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Mapping of (owner, digest) pairs that have been approved
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalStore {
    approved: BTreeMap<Address, BTreeSet<Hash32>>,
}

impl ApprovalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `owner` approves `digest`
    ///
    /// Returns `false` if the approval was already present.
    pub(crate) fn approve(&mut self, owner: Address, digest: Hash32) -> bool {
        self.approved.entry(owner).or_default().insert(digest)
    }

    pub fn is_approved(&self, owner: &Address, digest: &Hash32) -> bool {
        self.approved
            .get(owner)
            .map(|digests| digests.contains(digest))
            .unwrap_or(false)
    }

    /// Digests approved by one identity
    pub fn approved_by(&self, owner: &Address) -> Vec<Hash32> {
        self.approved
            .get(owner)
            .map(|digests| digests.iter().copied().collect())
            .unwrap_or_default()
    }
}
