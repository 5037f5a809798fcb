//! Multisig wallet: verified execution of actions
//!
//! An execution attempt moves through
//! `Received -> NonceReserved -> Verified -> Dispatched -> {Succeeded, Reverted}`.
//! A failure before `Verified` undoes the whole attempt, nonce included. A
//! failure while dispatching only undoes the dispatch: the nonce stays spent
//! and the outcome reports the revert.

use crate::crypto::{Address, Hash32};
use crate::multisig::action::{ActionDescriptor, Operation};
use crate::multisig::calls::WalletCall;
use crate::multisig::events::{EventLog, WalletEvent};
use crate::multisig::verifier::SignatureVerifier;
use crate::multisig::wallet::{MultisigError, StateSnapshot, WalletConfig, WalletState};
use crate::runtime::{CallError, Contract, Frame, World};
use std::fmt;
use std::sync::Arc;

/// Stages of one execution attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptStage {
    Received,
    NonceReserved,
    Verified,
    Dispatched,
    Succeeded,
    Reverted,
}

/// What happened to the dispatched action
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchStatus {
    /// The action ran; carries whatever the target returned
    Succeeded { output: Vec<u8> },
    /// The action failed and its effects were undone
    Reverted { reason: CallError },
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchStatus::Succeeded { .. } => write!(f, "succeeded"),
            DispatchStatus::Reverted { reason } => write!(f, "reverted: {}", reason),
        }
    }
}

/// Result of an accepted execution attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Digest the attestations were checked against
    pub digest: Hash32,
    /// Nonce the attempt consumed
    pub nonce: u64,
    /// Number of attestations that verified
    pub attestations: usize,
    pub status: DispatchStatus,
}

impl ExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, DispatchStatus::Succeeded { .. })
    }
}

/// Snapshot of everything an attempt can touch
struct Checkpoint {
    state: StateSnapshot,
    world: World,
}

impl Checkpoint {
    fn capture(wallet: &MultisigWallet) -> Self {
        Self {
            state: wallet.state.snapshot(),
            world: wallet.world.clone(),
        }
    }

    fn restore(self, wallet: &mut MultisigWallet) {
        wallet.state.rollback(self.state);
        wallet.world = self.world;
    }
}

/// A threshold wallet together with the accounts it can act on
///
/// Owners, threshold and nonce only change through [`execute`](Self::execute)
/// or the wallet calling itself through [`invoke`](Self::invoke). The state
/// cannot be taken apart and reassembled from outside the crate:
///
/// ```compile_fail
/// # use multisig_engine::crypto::Address;
/// # use multisig_engine::multisig::{MultisigWallet, WalletConfig};
/// let config = WalletConfig::new(Address::new([0xee; 20]), 1, vec![Address::new([1; 20])], 1).unwrap();
/// let wallet = MultisigWallet::new(&config).unwrap();
/// let (state, world) = wallet.into_parts();
/// ```
///
/// ```compile_fail
/// # use multisig_engine::crypto::Address;
/// # use multisig_engine::multisig::{MultisigWallet, WalletConfig};
/// let config = WalletConfig::new(Address::new([0xee; 20]), 1, vec![Address::new([1; 20])], 1).unwrap();
/// let wallet = MultisigWallet::new(&config).unwrap();
/// let mut state = wallet.state().clone();
/// state.add_owner(Address::new([6; 20])).unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct MultisigWallet {
    state: WalletState,
    world: World,
}

impl MultisigWallet {
    /// Provision a new wallet with an empty account world
    pub fn new(config: &WalletConfig) -> Result<Self, MultisigError> {
        Ok(Self {
            state: WalletState::new(config)?,
            world: World::new(),
        })
    }

    /// Reassemble a wallet from previously saved parts
    pub(crate) fn from_parts(state: WalletState, world: World) -> Result<Self, MultisigError> {
        state.validate()?;
        Ok(Self { state, world })
    }

    pub(crate) fn into_parts(self) -> (WalletState, World) {
        (self.state, self.world)
    }

    pub fn state(&self) -> &WalletState {
        &self.state
    }

    pub fn world(&self) -> &World {
        &self.world
    }


    pub fn address(&self) -> Address {
        self.state.address()
    }

    pub fn is_owner(&self, identity: &Address) -> bool {
        self.state.registry().is_owner(identity)
    }

    /// Owners, newest first
    pub fn owners(&self) -> Vec<Address> {
        self.state.registry().owners()
    }

    pub fn threshold(&self) -> usize {
        self.state.registry().threshold()
    }

    /// Nonce the next execution must be signed against
    pub fn nonce(&self) -> u64 {
        self.state.nonce()
    }

    pub fn is_approved(&self, owner: &Address, digest: &Hash32) -> bool {
        self.state.approvals().is_approved(owner, digest)
    }

    pub fn events(&self) -> &EventLog {
        self.state.events()
    }

    /// Digest owners sign to authorize `action` at `nonce`
    pub fn transaction_hash(&self, action: &ActionDescriptor, nonce: u64) -> Hash32 {
        self.state.transaction_hash(action, nonce)
    }

    pub fn balance(&self) -> u128 {
        self.world.balance_of(&self.state.address())
    }

    /// Fund the wallet
    pub fn deposit(&mut self, amount: u128) -> Result<u128, CallError> {
        let address = self.state.address();
        self.world.deposit(address, amount)
    }

    /// Fund any account
    pub fn deposit_to(&mut self, account: Address, amount: u128) -> Result<u128, CallError> {
        self.world.deposit(account, amount)
    }

    pub fn register_contract(&mut self, account: Address, contract: Arc<dyn Contract>) {
        self.world.register(account, contract);
    }

    /// Record that `sender` approves `digest`
    ///
    /// Anyone may approve; the approval only counts while `sender` is an owner.
    pub fn approve(&mut self, sender: Address, digest: Hash32) {
        if !self.is_owner(&sender) {
            log::debug!("Approval recorded for non-owner {}", sender);
        }
        self.state.approve_hash(sender, digest);
    }

    /// Call the wallet's own surface directly
    ///
    /// Only the wallet itself may do this; everyone else goes through
    /// [`execute`](Self::execute).
    pub fn invoke(&mut self, sender: Address, payload: &[u8]) -> Result<(), MultisigError> {
        if sender != self.state.address() {
            log::warn!("Rejected direct call from {}", sender);
            return Err(MultisigError::NotAuthorized(sender));
        }
        let call = WalletCall::decode(payload)?;
        self.state.apply(&call)
    }

    /// Verify `attestations` for `action` and dispatch it
    ///
    /// Verification failures return `Err` and leave the wallet untouched.
    /// Once verified the nonce is spent; a failing dispatch is reported as
    /// [`DispatchStatus::Reverted`].
    pub fn execute(
        &mut self,
        sender: Address,
        action: &ActionDescriptor,
        attestations: &[u8],
    ) -> Result<ExecutionOutcome, MultisigError> {
        log::debug!(
            "{:?}: {} {} from {}",
            AttemptStage::Received,
            action.operation,
            action.to,
            sender
        );
        let checkpoint = Checkpoint::capture(self);

        let nonce = self.state.advance_nonce();
        let digest = self.state.transaction_hash(action, nonce);
        log::debug!("{:?}: nonce {} digest {}", AttemptStage::NonceReserved, nonce, digest);

        let verified = SignatureVerifier::new(&self.state, &self.world, sender)
            .verify(&digest, attestations)
            .and_then(|count| {
                let threshold = self.state.registry().threshold();
                if count < threshold {
                    Err(MultisigError::InsufficientLength {
                        have: count,
                        need: threshold,
                    })
                } else {
                    Ok(count)
                }
            });

        let count = match verified {
            Ok(count) => count,
            Err(e) => {
                checkpoint.restore(self);
                log::warn!("Execution at nonce {} rejected: {}", nonce, e);
                return Err(e);
            }
        };
        log::debug!("{:?}: {} attestations", AttemptStage::Verified, count);

        let inner = Checkpoint::capture(self);
        let result = self.dispatch(sender, action);
        log::debug!("{:?}", AttemptStage::Dispatched);

        let status = match result {
            Ok(output) => {
                self.state.emit(WalletEvent::SuccessfulExecution { digest });
                log::info!("Executed {} at nonce {}", digest, nonce);
                log::debug!("{:?}", AttemptStage::Succeeded);
                DispatchStatus::Succeeded { output }
            }
            Err(reason) => {
                inner.restore(self);
                self.state.emit(WalletEvent::ExecutionReverted { digest });
                log::warn!("Execution {} at nonce {} reverted: {}", digest, nonce, reason);
                log::debug!("{:?}", AttemptStage::Reverted);
                DispatchStatus::Reverted { reason }
            }
        };

        Ok(ExecutionOutcome {
            digest,
            nonce,
            attestations: count,
            status,
        })
    }

    fn dispatch(&mut self, sender: Address, action: &ActionDescriptor) -> Result<Vec<u8>, CallError> {
        if action.to == self.state.address() {
            return self.dispatch_self_call(action);
        }
        match action.operation {
            Operation::Call => self.dispatch_call(action),
            Operation::DelegateCall => self.dispatch_delegate_call_unchecked(sender, action),
        }
    }

    /// The wallet calling its own surface; attached value stays put
    fn dispatch_self_call(&mut self, action: &ActionDescriptor) -> Result<Vec<u8>, CallError> {
        let call = WalletCall::decode(&action.data)?;
        self.state.apply(&call)?;
        Ok(Vec::new())
    }

    /// Isolated call: the target runs as itself and receives the value
    fn dispatch_call(&mut self, action: &ActionDescriptor) -> Result<Vec<u8>, CallError> {
        let wallet = self.state.address();
        self.world.transfer(wallet, action.to, action.value)?;

        let contract = match self.world.contract(&action.to) {
            Some(contract) => contract,
            None => return Ok(Vec::new()),
        };

        let storage = self.world.storage_mut(action.to);
        let mut frame = Frame::isolated(wallet, action.to, action.value, storage);
        contract.call(&mut frame, &action.data)
    }

    /// Delegated call: the target's logic runs as the wallet
    ///
    /// The logic sees the wallet's storage and gets mutable access to the
    /// whole wallet state. It can add or remove owners, change the threshold
    /// and spend nonces with no further authorization, and it can do so in
    /// the middle of an execution. Only delegate to logic trusted as much as
    /// the owners themselves. No value moves.
    fn dispatch_delegate_call_unchecked(
        &mut self,
        sender: Address,
        action: &ActionDescriptor,
    ) -> Result<Vec<u8>, CallError> {
        let contract = match self.world.contract(&action.to) {
            Some(contract) => contract,
            None => return Ok(Vec::new()),
        };

        let wallet = self.state.address();
        let storage = self.world.storage_mut(wallet);
        let mut frame = Frame::delegated(sender, storage, &mut self.state);
        contract.call(&mut frame, &action.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::multisig::signature::{encode_attestations, Attestation};
    use crate::runtime::Storage;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn sorted_keys(count: usize) -> Vec<KeyPair> {
        let mut keys: Vec<KeyPair> = (0..count).map(|_| KeyPair::generate()).collect();
        keys.sort_by_key(|k| k.address());
        keys
    }

    fn wallet_with(keys: &[KeyPair], threshold: usize) -> MultisigWallet {
        let owners = keys.iter().map(|k| k.address()).collect();
        let config = WalletConfig::new(Address::new([0xee; 20]), 1, owners, threshold).unwrap();
        MultisigWallet::new(&config).unwrap()
    }

    fn sign_all(wallet: &MultisigWallet, keys: &[&KeyPair], action: &ActionDescriptor) -> Vec<u8> {
        let digest = wallet.transaction_hash(action, wallet.nonce());
        let attestations: Vec<Attestation> = keys
            .iter()
            .map(|k| Attestation::signature(k.address(), k.sign_digest(&digest).unwrap()))
            .collect();
        encode_attestations(&attestations).unwrap()
    }

    fn self_call(wallet: &MultisigWallet, call: WalletCall) -> ActionDescriptor {
        ActionDescriptor::call(wallet.address(), call.encode())
    }

    /// Counts calls in its own storage and reports what it received
    struct Counter;

    impl Contract for Counter {
        fn call(&self, frame: &mut Frame<'_>, _payload: &[u8]) -> Result<Vec<u8>, CallError> {
            let count = frame.storage().get("count") + 1;
            let value = frame.value;
            frame.storage_mut().set("count", count);
            frame.storage_mut().set("received", value);
            Ok(count.to_be_bytes().to_vec())
        }
    }

    /// Delegated helper that adds an owner and spends a nonce, optionally failing afterwards
    struct OwnerInjector {
        owner: Address,
        fail: bool,
    }

    impl Contract for OwnerInjector {
        fn call(&self, frame: &mut Frame<'_>, _payload: &[u8]) -> Result<Vec<u8>, CallError> {
            frame.storage_mut().set("touched", 1);
            frame.add_owner(self.owner)?;
            frame.advance_nonce()?;
            if self.fail {
                return Err(CallError::Reverted("injector gave up".to_string()));
            }
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_known_signature_adds_owner() {
        let wallet_address = addr("0x8CA9c3D95f01a3C5C9eB451401DBD887b0959836");
        let deployer = addr("0x6d57e5fc5cf72c02b55bd313e0878b4c8fcd5b71");
        let new_owner = addr("0x166413eF8b4DAb37B2295f4cCBc820eF5A78c817");

        let config = WalletConfig::new(wallet_address, 11155111, vec![deployer], 1).unwrap();
        let mut wallet = MultisigWallet::new(&config).unwrap();

        let action = ActionDescriptor::call(
            wallet_address,
            WalletCall::AddOwner { owner: new_owner }.encode(),
        );
        let signature: [u8; 65] = hex::decode(
            "7dae698c67e9025227aa4306248990efbe6af61ae8a76f9f5b33d348e81eae52\
             51895fc567b14e8e32badc14739ead6464c43b1690a010f8ce226005909625161c",
        )
        .unwrap()
        .try_into()
        .unwrap();
        let bundle = encode_attestations(&[Attestation::signature(deployer, signature)]).unwrap();

        let outcome = wallet.execute(deployer, &action, &bundle).unwrap();

        assert!(outcome.succeeded());
        assert_eq!(
            outcome.digest.to_string(),
            "0x2fd144ed0e154669eec5b676b72581a06a4a91c2afc5803db2126b1746dc47fd"
        );
        assert_eq!(wallet.owners(), vec![new_owner, deployer]);
        assert_eq!(wallet.nonce(), 1);
        assert_eq!(
            wallet.events().events(),
            vec![
                WalletEvent::OwnerAdded { owner: new_owner },
                WalletEvent::SuccessfulExecution {
                    digest: outcome.digest
                },
            ]
        );
    }

    #[test]
    fn test_threshold_two() {
        let keys = sorted_keys(2);
        let mut wallet = wallet_with(&keys, 2);
        let action = self_call(&wallet, WalletCall::ChangeThreshold { threshold: 1 });

        let one = sign_all(&wallet, &[&keys[0]], &action);
        assert_eq!(
            wallet.execute(keys[0].address(), &action, &one),
            Err(MultisigError::InsufficientLength { have: 1, need: 2 })
        );
        assert_eq!(wallet.nonce(), 0);

        let both = sign_all(&wallet, &[&keys[0], &keys[1]], &action);
        let outcome = wallet.execute(keys[0].address(), &action, &both).unwrap();
        assert!(outcome.succeeded());
        assert_eq!(outcome.attestations, 2);
        assert_eq!(wallet.threshold(), 1);
    }

    #[test]
    fn test_failed_verification_changes_nothing() {
        let keys = sorted_keys(1);
        let mut wallet = wallet_with(&keys, 1);
        let outsider = KeyPair::generate();
        let action = ActionDescriptor::transfer(Address::new([1u8; 20]), 0);

        let bundle = sign_all(&wallet, &[&outsider], &action);
        let before = wallet.state().clone();

        assert_eq!(
            wallet.execute(keys[0].address(), &action, &bundle),
            Err(MultisigError::InvalidSignature)
        );
        assert_eq!(wallet.state(), &before);
        assert!(wallet.events().is_empty());
    }

    #[test]
    fn test_reverted_dispatch_still_spends_nonce() {
        let keys = sorted_keys(1);
        let mut wallet = wallet_with(&keys, 1);
        let owner = keys[0].address();

        // removing the only owner can never satisfy the threshold
        let action = self_call(
            &wallet,
            WalletCall::RemoveOwner {
                prev_owner: Address::SENTINEL,
                owner,
            },
        );
        let bundle = sign_all(&wallet, &[&keys[0]], &action);
        let outcome = wallet.execute(owner, &action, &bundle).unwrap();

        assert!(!outcome.succeeded());
        assert_eq!(
            outcome.status,
            DispatchStatus::Reverted {
                reason: CallError::Wallet(MultisigError::ThresholdUnreachable {
                    owners: 0,
                    threshold: 1
                })
            }
        );
        assert_eq!(wallet.nonce(), 1);
        assert_eq!(wallet.owners(), vec![owner]);
        assert_eq!(
            wallet.events().events(),
            vec![WalletEvent::ExecutionReverted {
                digest: outcome.digest
            }]
        );

        // the same bundle cannot be replayed
        assert_eq!(
            wallet.execute(owner, &action, &bundle),
            Err(MultisigError::InvalidSignature)
        );
        assert_eq!(wallet.nonce(), 1);
    }

    #[test]
    fn test_nonce_advances_once_per_accepted_attempt() {
        let keys = sorted_keys(1);
        let mut wallet = wallet_with(&keys, 1);
        let target = Address::new([7u8; 20]);

        for round in 0..3u64 {
            let value = if round == 1 { 1_000 } else { 0 };
            let action = ActionDescriptor::transfer(target, value);
            let bundle = sign_all(&wallet, &[&keys[0]], &action);
            let outcome = wallet.execute(keys[0].address(), &action, &bundle).unwrap();

            assert_eq!(outcome.nonce, round);
            assert_eq!(wallet.nonce(), round + 1);
            assert_eq!(outcome.succeeded(), round != 1);
        }
    }

    #[test]
    fn test_value_transfer_and_insufficient_balance() {
        let keys = sorted_keys(1);
        let mut wallet = wallet_with(&keys, 1);
        let recipient = Address::new([9u8; 20]);
        wallet.deposit(100).unwrap();

        let action = ActionDescriptor::transfer(recipient, 40);
        let bundle = sign_all(&wallet, &[&keys[0]], &action);
        assert!(wallet.execute(keys[0].address(), &action, &bundle).unwrap().succeeded());
        assert_eq!(wallet.balance(), 60);
        assert_eq!(wallet.world().balance_of(&recipient), 40);

        let action = ActionDescriptor::transfer(recipient, 61);
        let bundle = sign_all(&wallet, &[&keys[0]], &action);
        let outcome = wallet.execute(keys[0].address(), &action, &bundle).unwrap();
        assert_eq!(
            outcome.status,
            DispatchStatus::Reverted {
                reason: CallError::InsufficientBalance {
                    available: 60,
                    required: 61
                }
            }
        );
        assert_eq!(wallet.balance(), 60);
        assert_eq!(wallet.nonce(), 2);
    }

    #[test]
    fn test_isolated_call_runs_as_callee() {
        let keys = sorted_keys(1);
        let mut wallet = wallet_with(&keys, 1);
        let counter = Address::new([0xc0; 20]);
        wallet.register_contract(counter, Arc::new(Counter));
        wallet.deposit(10).unwrap();

        let action = ActionDescriptor::new(counter, 3, vec![], Operation::Call);
        let bundle = sign_all(&wallet, &[&keys[0]], &action);
        let outcome = wallet.execute(keys[0].address(), &action, &bundle).unwrap();

        assert_eq!(
            outcome.status,
            DispatchStatus::Succeeded {
                output: 1u128.to_be_bytes().to_vec()
            }
        );
        let storage = wallet.world().storage(&counter).unwrap();
        assert_eq!(storage.get("count"), 1);
        assert_eq!(storage.get("received"), 3);
        assert_eq!(wallet.world().balance_of(&counter), 3);
        assert!(wallet.world().storage(&wallet.address()).is_none());
    }

    #[test]
    fn test_delegated_call_mutates_wallet_state() {
        let keys = sorted_keys(1);
        let mut wallet = wallet_with(&keys, 1);
        let injector = Address::new([0xd0; 20]);
        let injected = Address::new([0x44; 20]);
        wallet.register_contract(
            injector,
            Arc::new(OwnerInjector {
                owner: injected,
                fail: false,
            }),
        );

        let action = ActionDescriptor::delegate_call(injector, vec![]);
        let bundle = sign_all(&wallet, &[&keys[0]], &action);
        let outcome = wallet.execute(keys[0].address(), &action, &bundle).unwrap();

        assert!(outcome.succeeded());
        assert!(wallet.is_owner(&injected));
        // one nonce for the execution, one spent by the delegated logic
        assert_eq!(wallet.nonce(), 2);
        // writes land in the wallet's storage, not the callee's
        assert_eq!(
            wallet.world().storage(&wallet.address()).map(|s| s.get("touched")),
            Some(1)
        );
        assert!(wallet.world().storage(&injector).is_none());
    }

    #[test]
    fn test_reverted_delegated_call_is_undone() {
        let keys = sorted_keys(1);
        let mut wallet = wallet_with(&keys, 1);
        let injector = Address::new([0xd0; 20]);
        let injected = Address::new([0x44; 20]);
        wallet.register_contract(
            injector,
            Arc::new(OwnerInjector {
                owner: injected,
                fail: true,
            }),
        );

        let action = ActionDescriptor::delegate_call(injector, vec![]);
        let bundle = sign_all(&wallet, &[&keys[0]], &action);
        let outcome = wallet.execute(keys[0].address(), &action, &bundle).unwrap();

        assert!(matches!(
            outcome.status,
            DispatchStatus::Reverted {
                reason: CallError::Reverted(_)
            }
        ));
        assert!(!wallet.is_owner(&injected));
        assert_eq!(wallet.nonce(), 1);
        assert_eq!(wallet.world().storage(&wallet.address()), None::<&Storage>);
        assert_eq!(
            wallet.events().events(),
            vec![WalletEvent::ExecutionReverted {
                digest: outcome.digest
            }]
        );
    }

    #[test]
    fn test_self_targeted_delegate_call() {
        let keys = sorted_keys(1);
        let mut wallet = wallet_with(&keys, 1);
        let added = Address::new([0x42; 20]);

        let action = ActionDescriptor::delegate_call(
            wallet.address(),
            WalletCall::AddOwner { owner: added }.encode(),
        );
        let bundle = sign_all(&wallet, &[&keys[0]], &action);
        let outcome = wallet.execute(keys[0].address(), &action, &bundle).unwrap();

        assert!(outcome.succeeded());
        assert_eq!(wallet.owners(), vec![added, keys[0].address()]);
        assert_eq!(wallet.nonce(), 1);
        assert_eq!(
            wallet.events().events(),
            vec![
                WalletEvent::OwnerAdded { owner: added },
                WalletEvent::SuccessfulExecution {
                    digest: outcome.digest
                },
            ]
        );
    }

    #[test]
    fn test_self_targeted_delegate_removal_reverts() {
        let keys = sorted_keys(2);
        let mut wallet = wallet_with(&keys, 2);
        let first = wallet.owners()[0];

        let removal = ActionDescriptor::delegate_call(
            wallet.address(),
            WalletCall::RemoveOwner {
                prev_owner: Address::SENTINEL,
                owner: first,
            }
            .encode(),
        );
        let bundle = sign_all(&wallet, &[&keys[0], &keys[1]], &removal);
        let outcome = wallet.execute(keys[0].address(), &removal, &bundle).unwrap();

        assert_eq!(
            outcome.status,
            DispatchStatus::Reverted {
                reason: CallError::Wallet(MultisigError::ThresholdUnreachable {
                    owners: 1,
                    threshold: 2
                })
            }
        );
        assert_eq!(wallet.nonce(), 1);
        assert!(wallet.is_owner(&first));
        assert_eq!(
            wallet.events().events(),
            vec![WalletEvent::ExecutionReverted {
                digest: outcome.digest
            }]
        );
    }

    #[test]
    fn test_rollback_keeps_earlier_events() {
        let keys = sorted_keys(1);
        let mut wallet = wallet_with(&keys, 1);
        let digest = Hash32::new([8u8; 32]);
        wallet.approve(keys[0].address(), digest);

        let action = ActionDescriptor::transfer(Address::new([2u8; 20]), 5);
        let bad = encode_attestations(&[Attestation::approved_hash(Address::new([9u8; 20]))]).unwrap();
        assert!(wallet.execute(keys[0].address(), &action, &bad).is_err());

        let bundle = sign_all(&wallet, &[&keys[0]], &action);
        let outcome = wallet.execute(keys[0].address(), &action, &bundle).unwrap();
        assert!(!outcome.succeeded());

        assert_eq!(
            wallet.events().events(),
            vec![
                WalletEvent::HashApproved {
                    digest,
                    owner: keys[0].address()
                },
                WalletEvent::ExecutionReverted {
                    digest: outcome.digest
                },
            ]
        );
        assert!(wallet.is_approved(&keys[0].address(), &digest));
    }

    #[test]
    fn test_invoke_is_self_only() {
        let keys = sorted_keys(1);
        let mut wallet = wallet_with(&keys, 1);
        let payload = WalletCall::AddOwner {
            owner: Address::new([3u8; 20]),
        }
        .encode();

        let owner = keys[0].address();
        assert_eq!(
            wallet.invoke(owner, &payload),
            Err(MultisigError::NotAuthorized(owner))
        );
        assert_eq!(wallet.owners(), vec![owner]);

        let wallet_address = wallet.address();
        wallet.invoke(wallet_address, &payload).unwrap();
        assert!(wallet.is_owner(&Address::new([3u8; 20])));
        assert_eq!(wallet.nonce(), 0);
    }

    #[test]
    fn test_signed_message_execution() {
        let keys = sorted_keys(1);
        let mut wallet = wallet_with(&keys, 1);
        let action = ActionDescriptor::transfer(Address::new([2u8; 20]), 0);
        let digest = wallet.transaction_hash(&action, wallet.nonce());

        let bundle = encode_attestations(&[Attestation::signature(
            keys[0].address(),
            keys[0].sign_message(&digest).unwrap(),
        )])
        .unwrap();

        assert!(wallet.execute(keys[0].address(), &action, &bundle).unwrap().succeeded());
    }

    #[test]
    fn test_sender_counts_as_approval() {
        let keys = sorted_keys(2);
        let mut wallet = wallet_with(&keys, 1);
        let action = ActionDescriptor::transfer(Address::new([2u8; 20]), 0);
        let executor = keys[1].address();
        let bundle = encode_attestations(&[Attestation::approved_hash(executor)]).unwrap();

        // someone else submitting needs a recorded approval
        assert_eq!(
            wallet.execute(keys[0].address(), &action, &bundle),
            Err(MultisigError::InvalidSignature)
        );
        assert!(wallet.execute(executor, &action, &bundle).unwrap().succeeded());
    }

    #[test]
    fn test_approval_stops_counting_after_removal() {
        let keys = sorted_keys(2);
        let mut wallet = wallet_with(&keys, 1);
        let (keeper, leaver) = (keys[0].address(), keys[1].address());

        // leaver pre-approves the action planned for nonce 1
        let later = ActionDescriptor::transfer(Address::new([2u8; 20]), 0);
        let later_digest = wallet.transaction_hash(&later, 1);
        wallet.approve(leaver, later_digest);
        assert!(wallet.is_approved(&leaver, &later_digest));

        let prev = wallet.state().registry().predecessor_of(&leaver).unwrap();
        let removal = self_call(
            &wallet,
            WalletCall::RemoveOwner {
                prev_owner: prev,
                owner: leaver,
            },
        );
        let bundle = sign_all(&wallet, &[&keys[0]], &removal);
        assert!(wallet.execute(keeper, &removal, &bundle).unwrap().succeeded());
        assert!(!wallet.is_owner(&leaver));

        let bundle = encode_attestations(&[Attestation::approved_hash(leaver)]).unwrap();
        assert!(wallet.is_approved(&leaver, &later_digest));
        assert_eq!(
            wallet.execute(keeper, &later, &bundle),
            Err(MultisigError::InvalidSignature)
        );
    }

    #[test]
    fn test_approve_emits_event() {
        let keys = sorted_keys(1);
        let mut wallet = wallet_with(&keys, 1);
        let digest = Hash32::new([8u8; 32]);
        wallet.approve(keys[0].address(), digest);

        assert_eq!(
            wallet.events().events(),
            vec![WalletEvent::HashApproved {
                digest,
                owner: keys[0].address()
            }]
        );
    }

    #[test]
    fn test_parts_round_trip() {
        let keys = sorted_keys(1);
        let wallet = wallet_with(&keys, 1);
        let (state, world) = wallet.into_parts();
        let restored = MultisigWallet::from_parts(state, world).unwrap();
        assert_eq!(restored.owners(), vec![keys[0].address()]);
    }
}
