//! Multisig Engine: threshold-authorized execution in Rust
//!
//! This crate provides a multi-signature wallet engine featuring:
//! - An owner registry with an approval threshold, mutable only by the wallet itself
//! - Replay protection through a monotonic nonce
//! - Typed-data digests (EIP-712 layout) binding wallet, chain, action and nonce
//! - Attestation bundles mixing ECDSA signatures, signed messages,
//!   pre-approved hashes and contract-validated approvals
//! - Atomic execution: failed verification changes nothing, a failed
//!   dispatch only spends the nonce
//! - A minimal account runtime for value transfers and callable logic
//! - JSON persistence, owner key files and a CLI
//!
//! # Example
//!
//! ```rust
//! use multisig_engine::crypto::Address;
//! use multisig_engine::multisig::{ActionDescriptor, MultisigWallet, WalletConfig};
//! use multisig_engine::signer::{Signer, SigningMode};
//! use multisig_engine::multisig::encode_attestations;
//!
//! let owner = Signer::new();
//! let config = WalletConfig::new(Address::new([0xee; 20]), 1, vec![owner.address()], 1).unwrap();
//! let mut wallet = MultisigWallet::new(&config).unwrap();
//! wallet.deposit(100).unwrap();
//!
//! // Pay 40 to someone
//! let action = ActionDescriptor::transfer(Address::new([0x42; 20]), 40);
//! let digest = wallet.transaction_hash(&action, wallet.nonce());
//! let bundle = encode_attestations(&[owner.sign(&digest, SigningMode::Typed).unwrap()]).unwrap();
//!
//! let outcome = wallet.execute(owner.address(), &action, &bundle).unwrap();
//! assert!(outcome.succeeded());
//! assert_eq!(wallet.balance(), 60);
//! ```

pub mod cli;
pub mod crypto;
pub mod multisig;
pub mod runtime;
pub mod signer;
pub mod storage;

// Re-export commonly used types
pub use crypto::{Address, Hash32, KeyPair};
pub use multisig::{
    ActionDescriptor, Attestation, ExecutionOutcome, MultisigError, MultisigWallet, Operation,
    WalletConfig,
};
pub use runtime::{CallError, Contract, World};
pub use signer::Signer;
pub use storage::Storage;
