//! ECDSA key management for owners
//!
//! Provides key pair generation, recoverable signing and signer recovery
//! using the secp256k1 elliptic curve. Identities are the last 20 bytes of
//! the Keccak-256 hash of the uncompressed public key.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::address::{Address, Hash32};
use super::hash::{keccak256, signed_message_hash};

/// Length of a packed `r || s || v` signature
pub const SIGNATURE_LENGTH: usize = 65;

/// Offset added to the recovery id of a direct signature
pub const RECOVERY_OFFSET: u8 = 27;

/// Extra offset marking a signed-message signature
pub const SIGNED_MESSAGE_OFFSET: u8 = 4;

/// Errors that can occur during key operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid recovery byte: {0}")]
    InvalidRecoveryId(u8),
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let stripped = hex_key.trim().trim_start_matches("0x");
        let bytes = hex::decode(stripped).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// The identity controlled by this key
    pub fn address(&self) -> Address {
        public_key_to_address(&self.public_key)
    }

    /// Sign a digest directly, returning `r || s || v` with `v` in {27, 28}
    pub fn sign_digest(&self, digest: &Hash32) -> Result<[u8; SIGNATURE_LENGTH], KeyError> {
        sign_recoverable(&self.secret_key, digest, RECOVERY_OFFSET)
    }

    /// Sign a digest as a prefixed message, returning `r || s || v` with `v` in {31, 32}
    pub fn sign_message(&self, digest: &Hash32) -> Result<[u8; SIGNATURE_LENGTH], KeyError> {
        let prefixed = signed_message_hash(digest);
        sign_recoverable(
            &self.secret_key,
            &prefixed,
            RECOVERY_OFFSET + SIGNED_MESSAGE_OFFSET,
        )
    }
}

/// Convert a public key to an identity
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Address::new(bytes)
}

/// Parse a public key from hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

fn sign_recoverable(
    secret_key: &SecretKey,
    digest: &Hash32,
    v_offset: u8,
) -> Result<[u8; SIGNATURE_LENGTH], KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest.as_bytes())?;
    let signature = secp.sign_ecdsa_recoverable(&message, secret_key);
    let (recovery_id, compact) = signature.serialize_compact();

    let mut out = [0u8; SIGNATURE_LENGTH];
    out[..64].copy_from_slice(&compact);
    out[64] = recovery_id.to_i32() as u8 + v_offset;
    Ok(out)
}

/// Recover the signing identity from `r || s` and a normalised recovery id (0 or 1)
pub fn recover_address(digest: &Hash32, rs: &[u8], recovery_id: u8) -> Result<Address, KeyError> {
    if rs.len() != 64 {
        return Err(KeyError::InvalidSignature);
    }
    if recovery_id > 1 {
        return Err(KeyError::InvalidRecoveryId(recovery_id));
    }

    let secp = Secp256k1::new();
    let recovery_id = RecoveryId::from_i32(i32::from(recovery_id))?;
    let signature = RecoverableSignature::from_compact(rs, recovery_id)
        .map_err(|_| KeyError::InvalidSignature)?;
    let message = Message::from_digest_slice(digest.as_bytes())?;
    let public_key = secp.recover_ecdsa(&message, &signature)?;
    Ok(public_key_to_address(&public_key))
}
