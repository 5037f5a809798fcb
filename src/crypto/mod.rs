//! Cryptographic utilities for the engine
//!
//! This module provides:
//! - Keccak-256 hashing and call selectors
//! - 20-byte identities and 32-byte digests
//! - ECDSA key management with signer recovery (secp256k1)

pub mod address;
pub mod hash;
pub mod keys;

pub use address::{Address, AddressError, Hash32};
pub use hash::{keccak256, keccak256_concat, keccak256_hex, selector, signed_message_hash};
pub use keys::{
    public_key_from_hex, public_key_to_address, recover_address, KeyError, KeyPair,
    RECOVERY_OFFSET, SIGNATURE_LENGTH, SIGNED_MESSAGE_OFFSET,
};
