//! Threshold-authorized execution
//!
//! A wallet holds a set of owners and a threshold. Any action it performs
//! must be backed by attestations from at least `threshold` distinct owners
//! over a digest bound to the wallet, the chain and the current nonce.
//!
//! # Example
//!
//! ```
//! use multisig_engine::crypto::{Address, KeyPair};
//! use multisig_engine::multisig::{
//!     encode_attestations, ActionDescriptor, Attestation, MultisigWallet, WalletCall,
//!     WalletConfig,
//! };
//!
//! let key = KeyPair::generate();
//! let wallet_address = Address::new([0xee; 20]);
//! let config = WalletConfig::new(wallet_address, 1, vec![key.address()], 1).unwrap();
//! let mut wallet = MultisigWallet::new(&config).unwrap();
//!
//! let new_owner = Address::new([0x42; 20]);
//! let action = ActionDescriptor::call(wallet_address, WalletCall::AddOwner { owner: new_owner }.encode());
//! let digest = wallet.transaction_hash(&action, wallet.nonce());
//! let bundle = encode_attestations(&[Attestation::signature(
//!     key.address(),
//!     key.sign_digest(&digest).unwrap(),
//! )])
//! .unwrap();
//!
//! let outcome = wallet.execute(key.address(), &action, &bundle).unwrap();
//! assert!(outcome.succeeded());
//! assert_eq!(wallet.owners(), vec![new_owner, key.address()]);
//! ```

pub mod action;
pub mod approvals;
pub mod calls;
pub mod events;
pub mod executor;
pub mod nonce;
pub mod owners;
pub mod signature;
pub mod verifier;
pub mod wallet;

pub use action::{ActionDescriptor, ActionHasher, Operation};
pub use approvals::ApprovalStore;
pub use calls::WalletCall;
pub use events::{EventLog, EventRecord, WalletEvent};
pub use executor::{AttemptStage, DispatchStatus, ExecutionOutcome, MultisigWallet};
pub use nonce::NonceCounter;
pub use owners::OwnerRegistry;
pub use signature::{
    decode_attestations, decode_signatures, encode_attestations, Attestation, SignatureBlock,
    SignatureScheme, SIGNATURE_BLOCK_LEN,
};
pub use verifier::SignatureVerifier;
pub use wallet::{MultisigError, WalletConfig, WalletState, DEFAULT_CHAIN_ID};
