//! Replay-protection counter

use serde::{Deserialize, Serialize};

/// Monotonic nonce bound to the wallet's execution history
///
/// Every accepted execution attempt consumes exactly one value, so a digest
/// signed for nonce `n` can never verify again once `n` is spent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NonceCounter(u64);

impl NonceCounter {
    pub fn new() -> Self {
        Self(0)
    }

    /// The value the next execution will be signed against
    pub fn current(&self) -> u64 {
        self.0
    }

    /// Return the current value and advance by one
    pub(crate) fn next(&mut self) -> u64 {
        let value = self.0;
        self.0 += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_returns_then_advances() {
        let mut nonce = NonceCounter::new();
        assert_eq!(nonce.current(), 0);
        assert_eq!(nonce.next(), 0);
        assert_eq!(nonce.next(), 1);
        assert_eq!(nonce.current(), 2);
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let mut nonce = NonceCounter::new();
        nonce.next();
        assert_eq!(serde_json::to_string(&nonce).unwrap(), "1");
    }
}
