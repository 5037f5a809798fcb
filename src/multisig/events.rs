//! Wallet events

use crate::crypto::{Address, Hash32};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something observable the wallet did
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WalletEvent {
    OwnerAdded { owner: Address },
    OwnerRemoved { owner: Address },
    ThresholdChanged { threshold: usize },
    HashApproved { digest: Hash32, owner: Address },
    SuccessfulExecution { digest: Hash32 },
    /// Verified execution whose dispatch failed; the nonce is still spent
    ExecutionReverted { digest: Hash32 },
}

impl fmt::Display for WalletEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletEvent::OwnerAdded { owner } => write!(f, "OwnerAdded({})", owner),
            WalletEvent::OwnerRemoved { owner } => write!(f, "OwnerRemoved({})", owner),
            WalletEvent::ThresholdChanged { threshold } => {
                write!(f, "ThresholdChanged({})", threshold)
            }
            WalletEvent::HashApproved { digest, owner } => {
                write!(f, "HashApproved({}, {})", digest, owner)
            }
            WalletEvent::SuccessfulExecution { digest } => {
                write!(f, "SuccessfulExecution({})", digest)
            }
            WalletEvent::ExecutionReverted { digest } => {
                write!(f, "ExecutionReverted({})", digest)
            }
        }
    }
}

/// An event with the time it was recorded
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(flatten)]
    pub event: WalletEvent,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only event log
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn emit(&mut self, event: WalletEvent) {
        log::debug!("Event: {}", event);
        self.records.push(EventRecord {
            event,
            recorded_at: Utc::now(),
        });
    }

    /// Drop records past `len`
    pub(crate) fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Events without their timestamps
    pub fn events(&self) -> Vec<WalletEvent> {
        self.records.iter().map(|r| r.event.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recent `count` records, oldest first
    pub fn tail(&self, count: usize) -> &[EventRecord] {
        let start = self.records.len().saturating_sub(count);
        &self.records[start..]
    }
}
