//! Minimal account runtime
//!
//! The wallet needs somewhere to send value and calls: per-account balances,
//! per-account storage and logic registered at an address. This is not a VM;
//! logic is plain Rust behind the [`Contract`] trait.

pub mod contract;
pub mod world;

pub use contract::{CallError, Contract, Frame, Storage, MAGIC_VALUE};
pub use world::World;
