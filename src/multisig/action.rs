//! Action descriptors and their canonical digest
//!
//! The digest follows the EIP-712 typed-data layout so that signatures
//! produced by standard wallet tooling verify unchanged:
//!
//! ```text
//! domain  = keccak(DOMAIN_TYPEHASH || chainId || verifyingContract)
//! struct  = keccak(TX_TYPEHASH || to || value || keccak(data) || operation || nonce)
//! digest  = keccak(0x19 0x01 || domain || struct)
//! ```

use crate::crypto::{keccak256, keccak256_concat, Address, Hash32};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type string of the signing domain
pub const DOMAIN_TYPE: &str = "EIP712Domain(uint256 chainId,address verifyingContract)";

/// Type string of an action
pub const TX_TYPE: &str = "Tx(address to,uint256 value,bytes data,uint8 operation,uint256 nonce)";

/// How the target is invoked
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Isolated call: the callee runs as itself and receives the value
    #[default]
    Call,
    /// The callee runs with the wallet's identity, storage and state
    DelegateCall,
}

impl Operation {
    pub fn as_u8(&self) -> u8 {
        match self {
            Operation::Call => 0,
            Operation::DelegateCall => 1,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Operation::Call),
            1 => Some(Operation::DelegateCall),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Call => write!(f, "call"),
            Operation::DelegateCall => write!(f, "delegatecall"),
        }
    }
}

/// An action the wallet is asked to perform
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub to: Address,
    pub value: u128,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    pub operation: Operation,
}

impl ActionDescriptor {
    pub fn new(to: Address, value: u128, data: Vec<u8>, operation: Operation) -> Self {
        Self {
            to,
            value,
            data,
            operation,
        }
    }

    /// Plain value transfer
    pub fn transfer(to: Address, value: u128) -> Self {
        Self::new(to, value, Vec::new(), Operation::Call)
    }

    /// Isolated call with a payload
    pub fn call(to: Address, data: Vec<u8>) -> Self {
        Self::new(to, 0, data, Operation::Call)
    }

    /// Delegated call with a payload
    pub fn delegate_call(to: Address, data: Vec<u8>) -> Self {
        Self::new(to, 0, data, Operation::DelegateCall)
    }
}

/// Derives digests for one wallet on one chain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionHasher {
    chain_id: u64,
    verifying_contract: Address,
}

impl ActionHasher {
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            chain_id,
            verifying_contract,
        }
    }

    /// Hash binding the wallet identity and chain
    pub fn domain_separator(&self) -> Hash32 {
        let type_hash = keccak256(DOMAIN_TYPE.as_bytes());
        keccak256_concat(&[
            type_hash.as_bytes(),
            &u64_word(self.chain_id),
            &self.verifying_contract.to_word(),
        ])
    }

    /// Hash of the action fields and nonce
    pub fn struct_hash(&self, action: &ActionDescriptor, nonce: u64) -> Hash32 {
        let type_hash = keccak256(TX_TYPE.as_bytes());
        let data_hash = keccak256(&action.data);
        keccak256_concat(&[
            type_hash.as_bytes(),
            &action.to.to_word(),
            &u128_word(action.value),
            data_hash.as_bytes(),
            &u64_word(u64::from(action.operation.as_u8())),
            &u64_word(nonce),
        ])
    }

    /// The digest owners sign for `action` at `nonce`
    pub fn digest(&self, action: &ActionDescriptor, nonce: u64) -> Hash32 {
        let domain = self.domain_separator();
        let structured = self.struct_hash(action, nonce);
        keccak256_concat(&[&[0x19, 0x01], domain.as_bytes(), structured.as_bytes()])
    }
}

/// 32-byte big-endian word
pub fn u64_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// 32-byte big-endian word
pub fn u128_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Serde helper rendering byte payloads as `0x`-prefixed hex
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(stripped).map_err(serde::de::Error::custom)
    }
}
