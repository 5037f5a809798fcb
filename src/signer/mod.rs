//! Signer module for owner keys and attestations

pub mod signer;

pub use signer::{Signer, SignerError, SignerInfo, SignerManager, SigningMode};
