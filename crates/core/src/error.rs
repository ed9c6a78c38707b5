//! Closed set of protocol failures. The strings are presentation only, but
//! calling tooling matches on them, so they are part of the contract.

use alloy_primitives::{Address, U256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// A privileged account entry was invoked by something other than the
    /// configured entry point.
    #[error("account: not from entry point")]
    NotEntryPoint,
    /// The signature does not recover to the relayer published by the beacon.
    #[error("relay only")]
    SignatureInvalid,
    /// Replayed or out-of-order operation.
    #[error("invalid nonce: expected {expected}, got {got}")]
    NonceMismatch { expected: U256, got: U256 },
    /// A payment or withdrawal exceeds the available balance.
    #[error("insufficient funds: need {needed}, available {available}")]
    InsufficientFunds { needed: U256, available: U256 },
    /// Call data is neither empty nor a known account call.
    #[error("malformed call data")]
    CallDataInvalid,
    /// Operation names a sender no factory has deployed.
    #[error("no account deployed at {0}")]
    UnknownAccount(Address),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Boundary tooling matches on these reason strings.
    #[test]
    fn reason_strings_are_stable() {
        assert_eq!(WalletError::NotEntryPoint.to_string(), "account: not from entry point");
        assert_eq!(WalletError::SignatureInvalid.to_string(), "relay only");
        assert_eq!(
            WalletError::NonceMismatch {
                expected: U256::ZERO,
                got: U256::from(1)
            }
            .to_string(),
            "invalid nonce: expected 0, got 1"
        );
    }
}
