//! The wallet's own call surface
//!
//! Payloads addressed to the wallet itself are ABI-encoded: a 4-byte selector
//! followed by 32-byte argument words.

use crate::crypto::{selector, Address};
use crate::multisig::action::u64_word;
use crate::multisig::wallet::MultisigError;
use serde::{Deserialize, Serialize};

pub const ADD_OWNER_SIGNATURE: &str = "addOwner(address)";
pub const REMOVE_OWNER_SIGNATURE: &str = "removeOwner(address,address)";
pub const CHANGE_THRESHOLD_SIGNATURE: &str = "changeThreshold(uint256)";

/// A self-only operation on the owner registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum WalletCall {
    AddOwner { owner: Address },
    RemoveOwner { prev_owner: Address, owner: Address },
    ChangeThreshold { threshold: u64 },
}

impl WalletCall {
    /// ABI-encode the call
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + 64);
        match self {
            WalletCall::AddOwner { owner } => {
                out.extend_from_slice(&selector(ADD_OWNER_SIGNATURE));
                out.extend_from_slice(&owner.to_word());
            }
            WalletCall::RemoveOwner { prev_owner, owner } => {
                out.extend_from_slice(&selector(REMOVE_OWNER_SIGNATURE));
                out.extend_from_slice(&prev_owner.to_word());
                out.extend_from_slice(&owner.to_word());
            }
            WalletCall::ChangeThreshold { threshold } => {
                out.extend_from_slice(&selector(CHANGE_THRESHOLD_SIGNATURE));
                out.extend_from_slice(&u64_word(*threshold));
            }
        }
        out
    }

    /// Decode a payload addressed to the wallet
    pub fn decode(payload: &[u8]) -> Result<Self, MultisigError> {
        if payload.len() < 4 {
            return Err(MultisigError::InvalidInput(format!(
                "payload of {} bytes has no selector",
                payload.len()
            )));
        }
        let (head, args) = payload.split_at(4);
        let words = split_words(args)?;

        if head == selector(ADD_OWNER_SIGNATURE) {
            expect_args(&words, 1)?;
            Ok(WalletCall::AddOwner {
                owner: address_arg(&words[0])?,
            })
        } else if head == selector(REMOVE_OWNER_SIGNATURE) {
            expect_args(&words, 2)?;
            Ok(WalletCall::RemoveOwner {
                prev_owner: address_arg(&words[0])?,
                owner: address_arg(&words[1])?,
            })
        } else if head == selector(CHANGE_THRESHOLD_SIGNATURE) {
            expect_args(&words, 1)?;
            Ok(WalletCall::ChangeThreshold {
                threshold: u64_arg(&words[0])?,
            })
        } else {
            Err(MultisigError::InvalidInput(format!(
                "unknown selector 0x{}",
                hex::encode(head)
            )))
        }
    }
}

fn split_words(args: &[u8]) -> Result<Vec<[u8; 32]>, MultisigError> {
    if args.len() % 32 != 0 {
        return Err(MultisigError::InvalidInput(format!(
            "arguments of {} bytes are not whole words",
            args.len()
        )));
    }
    Ok(args
        .chunks_exact(32)
        .map(|chunk| {
            let mut word = [0u8; 32];
            word.copy_from_slice(chunk);
            word
        })
        .collect())
}

fn expect_args(words: &[[u8; 32]], count: usize) -> Result<(), MultisigError> {
    if words.len() != count {
        return Err(MultisigError::InvalidInput(format!(
            "expected {} arguments, got {}",
            count,
            words.len()
        )));
    }
    Ok(())
}

fn address_arg(word: &[u8; 32]) -> Result<Address, MultisigError> {
    Address::from_word(word).map_err(|e| MultisigError::InvalidInput(e.to_string()))
}

fn u64_arg(word: &[u8; 32]) -> Result<u64, MultisigError> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(MultisigError::InvalidInput(
            "integer argument out of range".to_string(),
        ));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(bytes))
}
