//! Owner key management
//!
//! Provides key files for owners and turns digests into attestations.

use crate::crypto::{Address, Hash32, KeyError, KeyPair};
use crate::multisig::Attestation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Signer-related errors
#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Signer not found: {0}")]
    NotFound(Address),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
    #[error("Unknown signing mode: {0}")]
    UnknownMode(String),
}

/// How a signer attests to a digest
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningMode {
    /// Sign the typed-data digest directly (`v` 27/28)
    #[default]
    Typed,
    /// Sign the digest as a prefixed message (`v` 31/32)
    Message,
}

impl fmt::Display for SigningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningMode::Typed => write!(f, "typed"),
            SigningMode::Message => write!(f, "message"),
        }
    }
}

impl FromStr for SigningMode {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "typed" => Ok(SigningMode::Typed),
            "message" => Ok(SigningMode::Message),
            other => Err(SignerError::UnknownMode(other.to_string())),
        }
    }
}

/// Serializable key data for persistence
#[derive(Debug, Serialize, Deserialize)]
struct SignerData {
    private_key_hex: String,
    address: Address,
    label: Option<String>,
}

/// An owner's signing key
pub struct Signer {
    key_pair: KeyPair,
    /// Optional label for the key
    pub label: Option<String>,
}

impl Signer {
    /// Create a signer with a fresh key pair
    pub fn new() -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label: None,
        }
    }

    /// Create a signer with a label
    pub fn with_label(label: &str) -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label: Some(label.to_string()),
        }
    }

    /// Import a signer from a private key
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, SignerError> {
        let key_pair = KeyPair::from_private_key_hex(private_key_hex)?;
        Ok(Self {
            key_pair,
            label: None,
        })
    }

    pub fn address(&self) -> Address {
        self.key_pair.address()
    }

    pub fn public_key(&self) -> String {
        self.key_pair.public_key_hex()
    }

    /// Get the private key (hex)
    /// WARNING: Keep this secret!
    pub fn private_key(&self) -> String {
        self.key_pair.private_key_hex()
    }

    /// Attest to `digest` with a signature
    pub fn sign(&self, digest: &Hash32, mode: SigningMode) -> Result<Attestation, SignerError> {
        let signature = match mode {
            SigningMode::Typed => self.key_pair.sign_digest(digest)?,
            SigningMode::Message => self.key_pair.sign_message(digest)?,
        };
        Ok(Attestation::signature(self.address(), signature))
    }

    /// Attestation pointing at an approval this signer recorded
    pub fn approved_hash(&self) -> Attestation {
        Attestation::approved_hash(self.address())
    }

    /// Save key to file
    pub fn save(&self, path: &Path) -> Result<(), SignerError> {
        let data = SignerData {
            private_key_hex: self.private_key(),
            address: self.address(),
            label: self.label.clone(),
        };

        let json = serde_json::to_string_pretty(&data)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load key from file
    pub fn load(path: &Path) -> Result<Self, SignerError> {
        let json = fs::read_to_string(path)?;
        let data: SignerData = serde_json::from_str(&json)?;

        let mut signer = Self::from_private_key(&data.private_key_hex)?;
        signer.label = data.label;
        Ok(signer)
    }

    /// Export signer info (without private key)
    pub fn export_public_info(&self) -> SignerInfo {
        SignerInfo {
            address: self.address(),
            public_key: self.public_key(),
            label: self.label.clone(),
        }
    }
}

impl Default for Signer {
    fn default() -> Self {
        Self::new()
    }
}

/// Public signer information (safe to share)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerInfo {
    pub address: Address,
    pub public_key: String,
    pub label: Option<String>,
}

/// Manages a directory of key files, one per owner
pub struct SignerManager {
    keys_dir: PathBuf,
}

impl SignerManager {
    pub fn new(keys_dir: &Path) -> Result<Self, SignerError> {
        fs::create_dir_all(keys_dir)?;
        Ok(Self {
            keys_dir: keys_dir.to_path_buf(),
        })
    }

    fn key_path(&self, address: &Address) -> PathBuf {
        self.keys_dir.join(format!("{}.json", address))
    }

    /// Create and save a new signer
    pub fn create_signer(&self, label: Option<&str>) -> Result<Signer, SignerError> {
        let signer = match label {
            Some(l) => Signer::with_label(l),
            None => Signer::new(),
        };
        signer.save(&self.key_path(&signer.address()))?;
        log::info!("Created signer {}", signer.address());
        Ok(signer)
    }

    /// Save an existing private key
    pub fn import_signer(
        &self,
        private_key_hex: &str,
        label: Option<&str>,
    ) -> Result<Signer, SignerError> {
        let mut signer = Signer::from_private_key(private_key_hex)?;
        signer.label = label.map(str::to_string);
        signer.save(&self.key_path(&signer.address()))?;
        log::info!("Imported signer {}", signer.address());
        Ok(signer)
    }

    /// Public info of every readable key file, sorted by address
    pub fn list_signers(&self) -> Result<Vec<SignerInfo>, SignerError> {
        let mut signers = Vec::new();

        for entry in fs::read_dir(&self.keys_dir)? {
            let path = entry?.path();

            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match Signer::load(&path) {
                    Ok(signer) => signers.push(signer.export_public_info()),
                    Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
                }
            }
        }

        signers.sort_by_key(|s| s.address);
        Ok(signers)
    }

    pub fn load_signer(&self, address: &Address) -> Result<Signer, SignerError> {
        let path = self.key_path(address);
        if !path.exists() {
            return Err(SignerError::NotFound(*address));
        }
        Signer::load(&path)
    }

    pub fn delete_signer(&self, address: &Address) -> Result<(), SignerError> {
        let path = self.key_path(address);
        if !path.exists() {
            return Err(SignerError::NotFound(*address));
        }
        fs::remove_file(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keccak256;
    use crate::multisig::{decode_attestations, encode_attestations};

    const HARDHAT_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_signer_import() {
        let signer = Signer::from_private_key(HARDHAT_KEY).unwrap();
        assert_eq!(
            signer.address().to_checksum(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn test_signer_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("owner.json");

        let signer = Signer::with_label("Treasury");
        signer.save(&path).unwrap();

        let loaded = Signer::load(&path).unwrap();
        assert_eq!(loaded.address(), signer.address());
        assert_eq!(loaded.label.as_deref(), Some("Treasury"));
    }

    #[test]
    fn test_sign_modes_recover_signer() {
        let signer = Signer::new();
        let digest = keccak256(b"proposal");

        for mode in [SigningMode::Typed, SigningMode::Message] {
            let attestation = signer.sign(&digest, mode).unwrap();
            let bundle = encode_attestations(&[attestation.clone()]).unwrap();
            let decoded = decode_attestations(&bundle, &digest).unwrap();
            assert_eq!(decoded, vec![attestation]);
        }
    }

    #[test]
    fn test_signing_mode_parse() {
        assert_eq!("typed".parse::<SigningMode>().unwrap(), SigningMode::Typed);
        assert_eq!("message".parse::<SigningMode>().unwrap(), SigningMode::Message);
        assert!("eth_sign".parse::<SigningMode>().is_err());
    }

    #[test]
    fn test_manager_create_list_delete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = SignerManager::new(temp_dir.path()).unwrap();

        let first = manager.create_signer(Some("alice")).unwrap();
        let second = manager.import_signer(HARDHAT_KEY, None).unwrap();

        let listed: Vec<Address> = manager
            .list_signers()
            .unwrap()
            .into_iter()
            .map(|s| s.address)
            .collect();
        let mut expected = vec![first.address(), second.address()];
        expected.sort();
        assert_eq!(listed, expected);

        let loaded = manager.load_signer(&first.address()).unwrap();
        assert_eq!(loaded.label.as_deref(), Some("alice"));

        manager.delete_signer(&first.address()).unwrap();
        assert!(matches!(
            manager.load_signer(&first.address()),
            Err(SignerError::NotFound(_))
        ));
    }
}
