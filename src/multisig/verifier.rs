//! Attestation bundle verification
//!
//! A bundle passes when every attestation in it is valid, its signers are
//! strictly ascending and it has at least `threshold` entries. Validity is
//! all-or-nothing: one bad attestation fails the bundle even if the rest
//! would reach the threshold.

use crate::crypto::{Address, Hash32};
use crate::multisig::signature::{decode_signatures, SignatureBlock, SignatureScheme};
use crate::multisig::wallet::{MultisigError, WalletState};
use crate::runtime::{Storage, World, MAGIC_VALUE};

/// Checks bundles against one snapshot of wallet and account state
pub struct SignatureVerifier<'a> {
    state: &'a WalletState,
    world: &'a World,
    /// Account submitting the execution; counts as having approved
    executor: Address,
}

impl<'a> SignatureVerifier<'a> {
    pub fn new(state: &'a WalletState, world: &'a World, executor: Address) -> Self {
        Self {
            state,
            world,
            executor,
        }
    }

    /// Verify `bundle` for `digest`, returning the number of attestations
    pub fn verify(&self, digest: &Hash32, bundle: &[u8]) -> Result<usize, MultisigError> {
        let blocks = decode_signatures(bundle)?;

        let mut resolved = Vec::with_capacity(blocks.len());
        let mut last: Option<Address> = None;
        for block in &blocks {
            let signer = block.signer(digest)?;
            if last.map_or(false, |prev| signer <= prev) {
                return Err(MultisigError::InvalidAttestationOrder);
            }
            last = Some(signer);
            resolved.push((signer, block));
        }

        let threshold = self.state.registry().threshold();
        if blocks.len() < threshold {
            return Err(MultisigError::InsufficientLength {
                have: blocks.len(),
                need: threshold,
            });
        }

        for (signer, block) in &resolved {
            if !self.is_valid(signer, block, digest) {
                log::warn!("Attestation by {} rejected for {}", signer, digest);
                return Err(MultisigError::InvalidSignature);
            }
        }

        Ok(resolved.len())
    }

    fn is_valid(&self, signer: &Address, block: &SignatureBlock, digest: &Hash32) -> bool {
        if !self.state.registry().is_owner(signer) {
            log::debug!("{} is not an owner", signer);
            return false;
        }

        match block.scheme() {
            Some(SignatureScheme::Direct) | Some(SignatureScheme::SignedMessage) => true,
            Some(SignatureScheme::ApprovedHash) => {
                *signer == self.executor || self.state.approvals().is_approved(signer, digest)
            }
            Some(SignatureScheme::Contract) => self.contract_approves(signer, block, digest),
            None => false,
        }
    }

    fn contract_approves(&self, signer: &Address, block: &SignatureBlock, digest: &Hash32) -> bool {
        let contract = match self.world.contract(signer) {
            Some(contract) => contract,
            None => {
                log::debug!("{} has no logic to validate attestations", signer);
                return false;
            }
        };

        let empty = Storage::new();
        let storage = self.world.storage(signer).unwrap_or(&empty);
        let payload = block.payload.as_deref().unwrap_or_default();

        match contract.is_valid_signature(storage, digest, payload) {
            Ok(marker) => marker == MAGIC_VALUE,
            Err(e) => {
                log::debug!("Validation by {} failed: {}", signer, e);
                false
            }
        }
    }
}
