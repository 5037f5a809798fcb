//! Wallet state and its self-only operations
//!
//! [`WalletState`] is everything the wallet owns: its identity, the owner
//! registry, the nonce, the approval store and the event log. The mutators
//! here are reachable only from the wallet's own call surface or from logic
//! running in a delegated frame.

use crate::crypto::{Address, Hash32};
use crate::multisig::action::{ActionDescriptor, ActionHasher};
use crate::multisig::approvals::ApprovalStore;
use crate::multisig::calls::WalletCall;
use crate::multisig::events::{EventLog, WalletEvent};
use crate::multisig::nonce::NonceCounter;
use crate::multisig::owners::OwnerRegistry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain id used when none is configured (local development network)
pub const DEFAULT_CHAIN_ID: u64 = 31337;

/// Errors related to multisig operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("Invalid owner: {0}")]
    InvalidOwner(Address),
    #[error("Threshold unreachable: {owners} owners left for threshold {threshold}")]
    ThresholdUnreachable { owners: usize, threshold: usize },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not authorized: {0}")]
    NotAuthorized(Address),
    #[error("Malformed attestations: {0}")]
    MalformedAttestations(String),
    #[error("Insufficient attestations: have {have}, need {need}")]
    InsufficientLength { have: usize, need: usize },
    #[error("Attestations are not in strictly ascending signer order")]
    InvalidAttestationOrder,
    #[error("Invalid signature")]
    InvalidSignature,
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

/// Provisioning input for a wallet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletConfig {
    /// Identity of the wallet itself
    pub address: Address,
    /// Chain the wallet's digests are bound to
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Initial owners, in traversal order
    pub owners: Vec<Address>,
    /// Approvals required to execute
    pub threshold: usize,
}

impl WalletConfig {
    /// Create a new wallet configuration
    ///
    /// # Errors
    /// Returns error if the owner set or threshold could not be provisioned
    pub fn new(
        address: Address,
        chain_id: u64,
        owners: Vec<Address>,
        threshold: usize,
    ) -> Result<Self, MultisigError> {
        if address.is_zero() || address == Address::SENTINEL {
            return Err(MultisigError::InvalidInput(format!(
                "{} cannot be a wallet identity",
                address
            )));
        }
        OwnerRegistry::new(&owners, threshold, address)?;

        Ok(Self {
            address,
            chain_id,
            owners,
            threshold,
        })
    }
}

/// The parts of [`WalletState`] an execution attempt can change
///
/// Approvals are not included: nothing reachable from an attempt records one.
/// Events only grow, so the log is rolled back by length.
pub(crate) struct StateSnapshot {
    registry: OwnerRegistry,
    nonce: NonceCounter,
    events: usize,
}

/// Everything the wallet owns
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletState {
    address: Address,
    chain_id: u64,
    registry: OwnerRegistry,
    nonce: NonceCounter,
    approvals: ApprovalStore,
    events: EventLog,
}

impl WalletState {
    /// Provision a fresh wallet
    pub fn new(config: &WalletConfig) -> Result<Self, MultisigError> {
        let registry = OwnerRegistry::new(&config.owners, config.threshold, config.address)?;

        log::info!(
            "Provisioned wallet {} with {} owners, threshold {}",
            config.address,
            registry.len(),
            registry.threshold()
        );

        Ok(Self {
            address: config.address,
            chain_id: config.chain_id,
            registry,
            nonce: NonceCounter::new(),
            approvals: ApprovalStore::new(),
            events: EventLog::new(),
        })
    }

    /// Check invariants that deserialization cannot
    pub fn validate(&self) -> Result<(), MultisigError> {
        if self.registry.is_owner(&self.address) {
            return Err(MultisigError::InvalidOwner(self.address));
        }
        Ok(())
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn registry(&self) -> &OwnerRegistry {
        &self.registry
    }

    pub fn nonce(&self) -> u64 {
        self.nonce.current()
    }

    pub fn approvals(&self) -> &ApprovalStore {
        &self.approvals
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn hasher(&self) -> ActionHasher {
        ActionHasher::new(self.chain_id, self.address)
    }

    /// Digest of `action` at `nonce` for this wallet
    pub fn transaction_hash(&self, action: &ActionDescriptor, nonce: u64) -> Hash32 {
        self.hasher().digest(action, nonce)
    }

    /// Add an owner at the head of the traversal
    pub(crate) fn add_owner(&mut self, owner: Address) -> Result<(), MultisigError> {
        self.registry.add_owner(owner, self.address)?;
        log::info!("Owner added: {}", owner);
        self.events.emit(WalletEvent::OwnerAdded { owner });
        Ok(())
    }

    /// Remove an owner, naming its traversal predecessor
    pub(crate) fn remove_owner(&mut self, prev_owner: Address, owner: Address) -> Result<(), MultisigError> {
        self.registry.remove_owner(prev_owner, owner)?;
        log::info!("Owner removed: {}", owner);
        self.events.emit(WalletEvent::OwnerRemoved { owner });
        Ok(())
    }

    pub(crate) fn change_threshold(&mut self, threshold: usize) -> Result<(), MultisigError> {
        self.registry.change_threshold(threshold)?;
        log::info!("Threshold changed to {}", threshold);
        self.events.emit(WalletEvent::ThresholdChanged { threshold });
        Ok(())
    }

    /// Record an approval; repeating it is harmless
    pub(crate) fn approve_hash(&mut self, owner: Address, digest: Hash32) {
        if self.approvals.approve(owner, digest) {
            log::info!("{} approved {}", owner, digest);
        }
        self.events.emit(WalletEvent::HashApproved { digest, owner });
    }

    /// Spend the current nonce, returning it
    pub(crate) fn advance_nonce(&mut self) -> u64 {
        self.nonce.next()
    }

    /// Apply a decoded call on the wallet's own surface
    pub(crate) fn apply(&mut self, call: &WalletCall) -> Result<(), MultisigError> {
        match call {
            WalletCall::AddOwner { owner } => self.add_owner(*owner),
            WalletCall::RemoveOwner { prev_owner, owner } => self.remove_owner(*prev_owner, *owner),
            WalletCall::ChangeThreshold { threshold } => {
                let threshold = usize::try_from(*threshold).map_err(|_| {
                    MultisigError::InvalidInput(format!("threshold {} out of range", threshold))
                })?;
                self.change_threshold(threshold)
            }
        }
    }

    pub(crate) fn emit(&mut self, event: WalletEvent) {
        self.events.emit(event);
    }

    pub(crate) fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            registry: self.registry.clone(),
            nonce: self.nonce,
            events: self.events.len(),
        }
    }

    pub(crate) fn rollback(&mut self, snapshot: StateSnapshot) {
        self.registry = snapshot.registry;
        self.nonce = snapshot.nonce;
        self.events.truncate(snapshot.events);
    }
}
