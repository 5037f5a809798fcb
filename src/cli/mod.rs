//! Command handlers backing the `multisig` binary

pub mod commands;

pub use commands::*;
