//! Multisig wallet CLI application
//!
//! A command-line interface for provisioning a threshold wallet, collecting
//! owner attestations and executing actions.

use clap::{Parser, Subcommand};
use multisig_engine::cli::{self, AppState, ProposalKind};
use multisig_engine::crypto::Address;
use multisig_engine::multisig::DEFAULT_CHAIN_ID;
use multisig_engine::signer::{SignerManager, SigningMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multisig")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A threshold multi-signature wallet engine", long_about = None)]
struct Cli {
    /// Data directory for wallet storage
    #[arg(short, long, default_value = ".multisig_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a new wallet
    Init {
        /// Wallet identity (random if omitted)
        #[arg(short, long)]
        address: Option<Address>,

        /// Chain id the wallet's digests are bound to
        #[arg(short, long, default_value_t = DEFAULT_CHAIN_ID)]
        chain_id: u64,

        /// Owner addresses, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        owners: Vec<Address>,

        /// Approvals required to execute
        #[arg(short, long, default_value = "1")]
        threshold: usize,

        /// Replace an existing wallet
        #[arg(long)]
        force: bool,
    },

    /// Show owners, threshold, nonce and balance
    Owners,

    /// Create a proposal file
    Build {
        #[command(subcommand)]
        action: BuildCommands,

        /// Where to write the proposal (defaults to the proposals directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Owner key operations
    Keys {
        #[command(subcommand)]
        action: KeysCommands,
    },

    /// Attach an attestation to a proposal
    Sign {
        /// Proposal file
        #[arg(short, long)]
        proposal: PathBuf,

        /// Address of the signing key
        #[arg(short, long)]
        signer: Address,

        /// typed or message
        #[arg(short, long, default_value = "typed")]
        mode: SigningMode,

        /// Reference a recorded approval instead of signing
        #[arg(long)]
        approved: bool,
    },

    /// Record approval of a proposal's digest
    Approve {
        /// Proposal file
        #[arg(short, long)]
        proposal: PathBuf,

        /// Approving account
        #[arg(short, long)]
        sender: Address,
    },

    /// Execute a proposal
    Execute {
        /// Proposal file
        #[arg(short, long)]
        proposal: PathBuf,

        /// Submitting account
        #[arg(short, long)]
        sender: Address,
    },

    /// Fund an account
    Deposit {
        /// Amount to credit
        #[arg(short, long)]
        amount: u128,

        /// Account to credit (the wallet if omitted)
        #[arg(long)]
        account: Option<Address>,
    },

    /// Show recent events
    Events {
        /// Number of events to show
        #[arg(short, long, default_value = "20")]
        count: usize,
    },
}

#[derive(Subcommand)]
enum BuildCommands {
    /// Add an owner
    AddOwner {
        #[arg(long)]
        owner: Address,
    },

    /// Remove an owner
    RemoveOwner {
        #[arg(long)]
        owner: Address,
    },

    /// Change the threshold
    ChangeThreshold {
        #[arg(long)]
        threshold: u64,
    },

    /// Send value and/or a payload to an account
    Transfer {
        #[arg(long)]
        to: Address,

        #[arg(long, default_value = "0")]
        value: u128,

        /// Hex payload
        #[arg(long)]
        data: Option<String>,

        /// Run the target's logic as the wallet
        #[arg(long)]
        delegate: bool,
    },
}

#[derive(Subcommand)]
enum KeysCommands {
    /// Create a new key
    New {
        /// Optional label for the key
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Import a private key
    Import {
        #[arg(long)]
        private_key: String,

        #[arg(short, long)]
        label: Option<String>,
    },

    /// List all keys
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that do not need a provisioned wallet
    match &cli.command {
        Commands::Init {
            address,
            chain_id,
            owners,
            threshold,
            force,
        } => {
            return cli::cmd_init(
                &cli.data_dir,
                *address,
                *chain_id,
                owners.clone(),
                *threshold,
                *force,
            );
        }
        Commands::Keys { action } => {
            let signers = SignerManager::new(&cli.data_dir.join("keys"))?;
            return match action {
                KeysCommands::New { label } => cli::cmd_keys_new(&signers, label.as_deref()),
                KeysCommands::Import { private_key, label } => {
                    cli::cmd_keys_import(&signers, private_key, label.as_deref())
                }
                KeysCommands::List => cli::cmd_keys_list(&signers),
            };
        }
        _ => {}
    }

    // Initialize application state
    let mut state = AppState::new(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init { .. } | Commands::Keys { .. } => unreachable!(),

        Commands::Owners => {
            cli::cmd_owners(&state)?;
        }

        Commands::Build { action, output } => {
            let kind = match action {
                BuildCommands::AddOwner { owner } => ProposalKind::AddOwner { owner },
                BuildCommands::RemoveOwner { owner } => ProposalKind::RemoveOwner { owner },
                BuildCommands::ChangeThreshold { threshold } => {
                    ProposalKind::ChangeThreshold { threshold }
                }
                BuildCommands::Transfer {
                    to,
                    value,
                    data,
                    delegate,
                } => {
                    let data = match data {
                        Some(hex_data) => {
                            hex::decode(hex_data.strip_prefix("0x").unwrap_or(&hex_data))?
                        }
                        None => Vec::new(),
                    };
                    ProposalKind::Transfer {
                        to,
                        value,
                        data,
                        delegate,
                    }
                }
            };
            cli::cmd_build(&state, kind, output.as_deref())?;
        }

        Commands::Sign {
            proposal,
            signer,
            mode,
            approved,
        } => {
            cli::cmd_sign(&state, &proposal, &signer, mode, approved)?;
        }

        Commands::Approve { proposal, sender } => {
            cli::cmd_approve(&mut state, &proposal, &sender)?;
        }

        Commands::Execute { proposal, sender } => {
            cli::cmd_execute(&mut state, &proposal, &sender)?;
        }

        Commands::Deposit { amount, account } => {
            cli::cmd_deposit(&mut state, account, amount)?;
        }

        Commands::Events { count } => {
            cli::cmd_events(&state, count)?;
        }
    }

    Ok(())
}
