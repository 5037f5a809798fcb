//! Attestation bundle codec
//!
//! A bundle is a run of fixed 65-byte blocks, one per attestation, sorted
//! ascending by signer, followed by a trailer holding the payloads of
//! delegated (contract) attestations:
//!
//! ```text
//! block      = r[32] || s[32] || v[1]
//! delegated  = signer word || offset word || 0x00
//! trailer    = len[32] || payload   (one per delegated block, in block order)
//! ```
//!
//! The offset is measured from the start of the bundle. `v` selects the
//! scheme: 0 contract, 1 pre-approved hash, 27/28 direct signature,
//! 31/32 signed-message signature.

use crate::crypto::{
    recover_address, signed_message_hash, Address, Hash32, KeyError, RECOVERY_OFFSET,
    SIGNED_MESSAGE_OFFSET,
};
use crate::multisig::action::{hex_bytes, u64_word};
use crate::multisig::wallet::MultisigError;
use serde::{Deserialize, Serialize};

/// Size of one fixed block
pub const SIGNATURE_BLOCK_LEN: usize = 65;

/// Discriminator of a delegated (contract) attestation
pub const CONTRACT_SIGNATURE_TYPE: u8 = 0;

/// Discriminator of a pre-approved hash attestation
pub const APPROVED_HASH_TYPE: u8 = 1;

/// How an attestation is verified
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureScheme {
    /// Ask the signer's own validation entry point
    Contract,
    /// Look the digest up in the approval store
    ApprovedHash,
    /// secp256k1 signature over the prefixed digest
    SignedMessage,
    /// secp256k1 signature over the digest
    Direct,
}

impl SignatureScheme {
    pub fn from_v(v: u8) -> Option<Self> {
        match v {
            CONTRACT_SIGNATURE_TYPE => Some(SignatureScheme::Contract),
            APPROVED_HASH_TYPE => Some(SignatureScheme::ApprovedHash),
            27 | 28 => Some(SignatureScheme::Direct),
            v if v > 30 => Some(SignatureScheme::SignedMessage),
            _ => None,
        }
    }
}

/// One decoded fixed block, with its trailer payload if it has one
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureBlock {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u8,
    pub payload: Option<Vec<u8>>,
}

impl SignatureBlock {
    pub fn scheme(&self) -> Option<SignatureScheme> {
        SignatureScheme::from_v(self.v)
    }

    /// The raw 65 bytes of the fixed block
    pub fn raw(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SIGNATURE_BLOCK_LEN);
        out.extend_from_slice(&self.r);
        out.extend_from_slice(&self.s);
        out.push(self.v);
        out
    }

    /// Identity this block speaks for
    ///
    /// For signature schemes this recovers the signer from `digest`; the
    /// other schemes carry the signer in `r`.
    pub fn signer(&self, digest: &Hash32) -> Result<Address, MultisigError> {
        let scheme = self.scheme().ok_or(MultisigError::InvalidSignature)?;
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);

        let recovered = match scheme {
            SignatureScheme::Contract | SignatureScheme::ApprovedHash => {
                return Address::from_word(&self.r).map_err(|_| MultisigError::InvalidSignature);
            }
            SignatureScheme::Direct => recover_address(digest, &rs, self.v - RECOVERY_OFFSET),
            SignatureScheme::SignedMessage => recover_address(
                &signed_message_hash(digest),
                &rs,
                self.v - SIGNED_MESSAGE_OFFSET - RECOVERY_OFFSET,
            ),
        };

        recovered.map_err(|e: KeyError| {
            log::debug!("Signer recovery failed: {}", e);
            MultisigError::InvalidSignature
        })
    }

    /// Convert back to the caller-side form
    pub fn to_attestation(&self, digest: &Hash32) -> Result<Attestation, MultisigError> {
        let signer = self.signer(digest)?;
        Ok(match &self.payload {
            Some(payload) => Attestation::contract(signer, payload.clone()),
            None => Attestation {
                signer,
                data: self.raw(),
                delegated: false,
            },
        })
    }
}

/// One owner's approval, as produced by signing tooling
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub signer: Address,
    /// 65-byte block, or the contract payload when `delegated`
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    #[serde(default)]
    pub delegated: bool,
}

impl Attestation {
    /// A signature block (`r || s || v`) made by `signer`
    pub fn signature(signer: Address, signature: [u8; SIGNATURE_BLOCK_LEN]) -> Self {
        Self {
            signer,
            data: signature.to_vec(),
            delegated: false,
        }
    }

    /// Reference to an approval `signer` recorded (or implies as executor)
    pub fn approved_hash(signer: Address) -> Self {
        let mut data = Vec::with_capacity(SIGNATURE_BLOCK_LEN);
        data.extend_from_slice(&signer.to_word());
        data.extend_from_slice(&[0u8; 32]);
        data.push(APPROVED_HASH_TYPE);
        Self {
            signer,
            data,
            delegated: false,
        }
    }

    /// Attestation checked by the signer's own validation logic
    pub fn contract(signer: Address, payload: Vec<u8>) -> Self {
        Self {
            signer,
            data: payload,
            delegated: true,
        }
    }
}

/// Pack attestations into bundle bytes, sorting them by signer
pub fn encode_attestations(attestations: &[Attestation]) -> Result<Vec<u8>, MultisigError> {
    let mut sorted: Vec<&Attestation> = attestations.iter().collect();
    sorted.sort_by(|a, b| a.signer.cmp(&b.signer));

    let fixed_len = sorted.len() * SIGNATURE_BLOCK_LEN;
    let mut fixed = Vec::with_capacity(fixed_len);
    let mut dynamic = Vec::new();

    for attestation in sorted {
        if attestation.delegated {
            let offset = (fixed_len + dynamic.len()) as u64;
            fixed.extend_from_slice(&attestation.signer.to_word());
            fixed.extend_from_slice(&u64_word(offset));
            fixed.push(CONTRACT_SIGNATURE_TYPE);

            dynamic.extend_from_slice(&u64_word(attestation.data.len() as u64));
            dynamic.extend_from_slice(&attestation.data);
        } else {
            if attestation.data.len() != SIGNATURE_BLOCK_LEN {
                return Err(MultisigError::InvalidInput(format!(
                    "attestation by {} is {} bytes, expected {}",
                    attestation.signer,
                    attestation.data.len(),
                    SIGNATURE_BLOCK_LEN
                )));
            }
            fixed.extend_from_slice(&attestation.data);
        }
    }

    fixed.extend_from_slice(&dynamic);
    Ok(fixed)
}

/// Split bundle bytes into fixed blocks and resolve trailer payloads
///
/// The fixed region ends where the first trailer entry begins (or at the end
/// of the buffer when no block is delegated) and must hold a whole number of
/// blocks.
pub fn decode_signatures(bytes: &[u8]) -> Result<Vec<SignatureBlock>, MultisigError> {
    if bytes.len() < SIGNATURE_BLOCK_LEN {
        return Err(MultisigError::MalformedAttestations(format!(
            "{} bytes is shorter than one {}-byte block",
            bytes.len(),
            SIGNATURE_BLOCK_LEN
        )));
    }

    let mut fixed_end = bytes.len();
    let mut blocks = Vec::new();
    let mut index = 0;

    while (index + 1) * SIGNATURE_BLOCK_LEN <= fixed_end {
        let start = index * SIGNATURE_BLOCK_LEN;
        let block = &bytes[start..start + SIGNATURE_BLOCK_LEN];

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&block[..32]);
        s.copy_from_slice(&block[32..64]);
        let v = block[64];

        let payload = if v == CONTRACT_SIGNATURE_TYPE {
            let offset = word_to_usize(&s)?;
            if offset < start + SIGNATURE_BLOCK_LEN {
                return Err(MultisigError::MalformedAttestations(format!(
                    "block {} points into the fixed region at {}",
                    index, offset
                )));
            }
            let payload = read_trailer(bytes, offset)?;
            fixed_end = fixed_end.min(offset);
            Some(payload)
        } else {
            None
        };

        blocks.push(SignatureBlock { r, s, v, payload });
        index += 1;
    }

    if index * SIGNATURE_BLOCK_LEN != fixed_end {
        return Err(MultisigError::MalformedAttestations(format!(
            "fixed region of {} bytes is not a whole number of blocks",
            fixed_end
        )));
    }

    Ok(blocks)
}

/// Decode a bundle all the way back to attestations
pub fn decode_attestations(bytes: &[u8], digest: &Hash32) -> Result<Vec<Attestation>, MultisigError> {
    decode_signatures(bytes)?
        .iter()
        .map(|block| block.to_attestation(digest))
        .collect()
}

fn read_trailer(bytes: &[u8], offset: usize) -> Result<Vec<u8>, MultisigError> {
    let len_end = offset
        .checked_add(32)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| {
            MultisigError::MalformedAttestations(format!("trailer offset {} out of range", offset))
        })?;

    let mut len_word = [0u8; 32];
    len_word.copy_from_slice(&bytes[offset..len_end]);
    let len = word_to_usize(&len_word)?;

    let end = len_end
        .checked_add(len)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| {
            MultisigError::MalformedAttestations(format!(
                "trailer entry at {} runs past the bundle",
                offset
            ))
        })?;

    Ok(bytes[len_end..end].to_vec())
}

fn word_to_usize(word: &[u8; 32]) -> Result<usize, MultisigError> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(MultisigError::MalformedAttestations(
            "word value out of range".to_string(),
        ));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(bytes)).map_err(|_| {
        MultisigError::MalformedAttestations("word value out of range".to_string())
    })
}
