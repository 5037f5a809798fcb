//! CLI commands for the multisig wallet
//!
//! Implements all command handlers for the CLI interface.

use crate::crypto::{Address, Hash32};
use crate::multisig::{
    encode_attestations, ActionDescriptor, Attestation, DispatchStatus, MultisigWallet,
    Operation, WalletCall, WalletConfig,
};
use crate::signer::{SignerManager, SigningMode};
use crate::storage::{load_from_file, save_to_file, Storage, StorageConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// An action waiting for attestations, as passed between owners
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub wallet: Address,
    pub chain_id: u64,
    pub nonce: u64,
    pub action: ActionDescriptor,
    pub digest: Hash32,
    #[serde(default)]
    pub attestations: Vec<Attestation>,
}

impl Proposal {
    /// Build a proposal for `action` at the wallet's current nonce
    pub fn new(wallet: &MultisigWallet, action: ActionDescriptor) -> Self {
        let nonce = wallet.nonce();
        Self {
            wallet: wallet.address(),
            chain_id: wallet.state().chain_id(),
            nonce,
            digest: wallet.transaction_hash(&action, nonce),
            action,
            attestations: Vec::new(),
        }
    }

    /// Add or replace the attestation of one signer
    pub fn attach(&mut self, attestation: Attestation) {
        self.attestations.retain(|a| a.signer != attestation.signer);
        self.attestations.push(attestation);
    }

    /// Make sure the proposal still matches the wallet it is about to run on
    fn check_against(&self, wallet: &MultisigWallet) -> CliResult<()> {
        if self.wallet != wallet.address() || self.chain_id != wallet.state().chain_id() {
            return Err(format!(
                "proposal is for wallet {} on chain {}",
                self.wallet, self.chain_id
            )
            .into());
        }
        if self.nonce != wallet.nonce() {
            return Err(format!(
                "proposal nonce {} is stale, wallet is at {}",
                self.nonce,
                wallet.nonce()
            )
            .into());
        }
        if wallet.transaction_hash(&self.action, self.nonce) != self.digest {
            return Err("proposal digest does not match its action".into());
        }
        Ok(())
    }
}

/// What `build` should propose
#[derive(Debug, Clone)]
pub enum ProposalKind {
    AddOwner { owner: Address },
    RemoveOwner { owner: Address },
    ChangeThreshold { threshold: u64 },
    Transfer {
        to: Address,
        value: u128,
        data: Vec<u8>,
        delegate: bool,
    },
}

/// Application state
pub struct AppState {
    pub wallet: MultisigWallet,
    pub storage: Storage,
    pub signers: SignerManager,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the wallet stored under `data_dir`
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage = open_storage(&data_dir)?;
        let signers = SignerManager::new(&data_dir.join("keys"))?;

        if !storage.exists() {
            return Err(format!(
                "no wallet at {:?}; create one with: multisig init",
                data_dir
            )
            .into());
        }
        let wallet = storage.load()?;

        Ok(Self {
            wallet,
            storage,
            signers,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.wallet)?;
        Ok(())
    }

    fn proposals_dir(&self) -> PathBuf {
        self.data_dir.join("proposals")
    }
}

fn open_storage(data_dir: &Path) -> CliResult<Storage> {
    let storage_config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    Ok(Storage::new(storage_config)?)
}

/// Provision a new wallet
pub fn cmd_init(
    data_dir: &Path,
    address: Option<Address>,
    chain_id: u64,
    owners: Vec<Address>,
    threshold: usize,
    force: bool,
) -> CliResult<()> {
    let storage = open_storage(data_dir)?;

    if storage.exists() && !force {
        println!("⚠️  Wallet already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (this will delete existing data)");
        return Ok(());
    }

    let address = address.unwrap_or_else(|| Address::new(rand::random()));
    let config = WalletConfig::new(address, chain_id, owners, threshold)?;
    let wallet = MultisigWallet::new(&config)?;

    storage.delete()?;
    storage.save(&wallet)?;

    println!("✅ Wallet initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   📍 Address: {}", wallet.address().to_checksum());
    println!("   ⛓️  Chain id: {}", chain_id);
    println!("   👥 Owners: {}", wallet.owners().len());
    println!("   🔐 Threshold: {}", wallet.threshold());

    Ok(())
}

/// Show owners, threshold, nonce and balance
pub fn cmd_owners(state: &AppState) -> CliResult<()> {
    let wallet = &state.wallet;

    println!("🔐 Wallet {}", wallet.address().to_checksum());
    println!("   ├─ Chain id: {}", wallet.state().chain_id());
    println!("   ├─ Threshold: {} of {}", wallet.threshold(), wallet.owners().len());
    println!("   ├─ Nonce: {}", wallet.nonce());
    println!("   ├─ Balance: {}", wallet.balance());
    println!("   └─ Owners:");
    for owner in wallet.owners() {
        println!("      {}", owner.to_checksum());
    }

    Ok(())
}

/// Turn a proposal kind into the action the wallet will run
pub fn build_action(wallet: &MultisigWallet, kind: ProposalKind) -> CliResult<ActionDescriptor> {
    let call = match kind {
        ProposalKind::AddOwner { owner } => WalletCall::AddOwner { owner },
        ProposalKind::RemoveOwner { owner } => {
            let prev_owner = wallet
                .state()
                .registry()
                .predecessor_of(&owner)
                .ok_or_else(|| format!("{} is not an owner", owner))?;
            WalletCall::RemoveOwner { prev_owner, owner }
        }
        ProposalKind::ChangeThreshold { threshold } => WalletCall::ChangeThreshold { threshold },
        ProposalKind::Transfer {
            to,
            value,
            data,
            delegate,
        } => {
            let operation = if delegate {
                Operation::DelegateCall
            } else {
                Operation::Call
            };
            return Ok(ActionDescriptor::new(to, value, data, operation));
        }
    };

    Ok(ActionDescriptor::call(wallet.address(), call.encode()))
}

/// Write a proposal file for an action
pub fn cmd_build(state: &AppState, kind: ProposalKind, output: Option<&Path>) -> CliResult<PathBuf> {
    let action = build_action(&state.wallet, kind)?;
    let proposal = Proposal::new(&state.wallet, action);

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => {
            fs::create_dir_all(state.proposals_dir())?;
            state
                .proposals_dir()
                .join(format!("nonce-{}.json", proposal.nonce))
        }
    };
    save_to_file(&proposal, &path)?;

    println!("📝 Proposal created:");
    println!("   ├─ To: {}", proposal.action.to.to_checksum());
    println!("   ├─ Value: {}", proposal.action.value);
    println!("   ├─ Operation: {}", proposal.action.operation);
    println!("   ├─ Data: 0x{}", hex::encode(&proposal.action.data));
    println!("   ├─ Nonce: {}", proposal.nonce);
    println!("   └─ Digest: {}", proposal.digest);
    println!("\n   Saved to {:?}", path);

    Ok(path)
}

/// Create a new owner key
pub fn cmd_keys_new(signers: &SignerManager, label: Option<&str>) -> CliResult<()> {
    let signer = signers.create_signer(label)?;

    println!("🔑 New key created!");
    println!("   📍 Address: {}", signer.address().to_checksum());
    if let Some(l) = &signer.label {
        println!("   🏷️  Label: {}", l);
    }
    println!("\n   ⚠️  IMPORTANT: The private key is stored in the keys directory.");

    Ok(())
}

/// Import an existing owner key
pub fn cmd_keys_import(
    signers: &SignerManager,
    private_key: &str,
    label: Option<&str>,
) -> CliResult<()> {
    let signer = signers.import_signer(private_key, label)?;
    println!("🔑 Key imported: {}", signer.address().to_checksum());
    Ok(())
}

/// List owner keys
pub fn cmd_keys_list(signers: &SignerManager) -> CliResult<()> {
    let keys = signers.list_signers()?;

    if keys.is_empty() {
        println!("📭 No keys found. Create one with: multisig keys new");
        return Ok(());
    }

    println!("📋 Keys:");
    for info in &keys {
        let label = info.label.as_deref().unwrap_or("-");
        println!("   {} ({})", info.address.to_checksum(), label);
    }

    Ok(())
}

/// Attach a signer's attestation to a proposal file
pub fn cmd_sign(
    state: &AppState,
    proposal_path: &Path,
    signer: &Address,
    mode: SigningMode,
    approved: bool,
) -> CliResult<()> {
    let mut proposal: Proposal = load_from_file(proposal_path)?;
    proposal.check_against(&state.wallet)?;

    let signer = state.signers.load_signer(signer)?;
    let attestation = if approved {
        signer.approved_hash()
    } else {
        signer.sign(&proposal.digest, mode)?
    };
    proposal.attach(attestation);
    save_to_file(&proposal, proposal_path)?;

    if !state.wallet.is_owner(&signer.address()) {
        println!("⚠️  {} is not an owner; this attestation will not count", signer.address());
    }
    println!("✍️  Attestation added by {}", signer.address().to_checksum());
    println!(
        "   {} of {} required",
        proposal.attestations.len(),
        state.wallet.threshold()
    );

    Ok(())
}

/// Record a signer's approval of a proposal's digest
pub fn cmd_approve(state: &mut AppState, proposal_path: &Path, sender: &Address) -> CliResult<()> {
    let proposal: Proposal = load_from_file(proposal_path)?;
    proposal.check_against(&state.wallet)?;

    state.wallet.approve(*sender, proposal.digest);
    state.save()?;

    println!("👍 {} approved {}", sender.to_checksum(), proposal.digest);
    Ok(())
}

/// Execute a proposal with the attestations collected so far
pub fn cmd_execute(state: &mut AppState, proposal_path: &Path, sender: &Address) -> CliResult<()> {
    let proposal: Proposal = load_from_file(proposal_path)?;
    proposal.check_against(&state.wallet)?;

    let bundle = encode_attestations(&proposal.attestations)?;

    println!("🚀 Executing nonce {} from {}...", proposal.nonce, sender.to_checksum());
    let outcome = state.wallet.execute(*sender, &proposal.action, &bundle)?;
    state.save()?;

    match &outcome.status {
        DispatchStatus::Succeeded { output } => {
            println!("✅ Execution succeeded!");
            if !output.is_empty() {
                println!("   Output: 0x{}", hex::encode(output));
            }
        }
        DispatchStatus::Reverted { reason } => {
            println!("❌ Execution reverted: {}", reason);
            println!("   The nonce was still consumed.");
        }
    }
    println!("   Digest: {}", outcome.digest);
    println!("   Attestations: {}", outcome.attestations);
    println!("   Next nonce: {}", state.wallet.nonce());

    Ok(())
}

/// Fund an account (the wallet by default)
pub fn cmd_deposit(state: &mut AppState, account: Option<Address>, amount: u128) -> CliResult<()> {
    let account = account.unwrap_or_else(|| state.wallet.address());
    let balance = state.wallet.deposit_to(account, amount)?;
    state.save()?;

    println!("💰 Deposited {} to {}", amount, account.to_checksum());
    println!("   New balance: {}", balance);
    Ok(())
}

/// Show recent events
pub fn cmd_events(state: &AppState, count: usize) -> CliResult<()> {
    let events = state.wallet.events();

    if events.is_empty() {
        println!("📭 No events yet.");
        return Ok(());
    }

    println!("📜 Events ({} total):", events.len());
    for record in events.tail(count) {
        println!(
            "   {} | {}",
            record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            record.event
        );
    }

    Ok(())
}
