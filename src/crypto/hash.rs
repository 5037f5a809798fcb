//! Cryptographic hashing utilities for the engine
//!
//! Provides the Keccak-256 hashing used for identities, action digests,
//! call selectors and signed-message prefixes.

use super::address::Hash32;
use sha3::{Digest, Keccak256};

/// Prefix applied to a 32-byte digest before "signed message" signing
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Computes Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> Hash32 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    finish(hasher)
}

/// Computes Keccak-256 over several slices without concatenating them first
pub fn keccak256_concat(parts: &[&[u8]]) -> Hash32 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    finish(hasher)
}

fn finish(hasher: Keccak256) -> Hash32 {
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    Hash32::new(out)
}

/// Computes Keccak-256 hash and returns it as a hex string
pub fn keccak256_hex(data: &[u8]) -> String {
    hex::encode(keccak256(data).as_bytes())
}

/// Re-hash a digest under the signed-message domain prefix
pub fn signed_message_hash(digest: &Hash32) -> Hash32 {
    keccak256_concat(&[SIGNED_MESSAGE_PREFIX, digest.as_bytes()])
}

/// First four bytes of the hash of a function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash.as_bytes()[..4]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256() {
        assert_eq!(
            keccak256_hex(b""),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak256_concat_matches_single() {
        let joined = keccak256(b"hello world");
        let parts = keccak256_concat(&[&b"hello"[..], &b" "[..], &b"world"[..]]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_selector() {
        assert_eq!(selector("addOwner(address)"), [0x70, 0x65, 0xcb, 0x48]);
        assert_eq!(
            selector("isValidSignature(bytes32,bytes)"),
            [0x16, 0x26, 0xba, 0x7e]
        );
    }
}
