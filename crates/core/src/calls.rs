//! ABI surface an account exposes through its execute path.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolInterface, sol};

use crate::error::WalletError;

sol! {
    interface IBlessedAccount {
        function execute(address target, uint256 value, bytes calldata data);
        function withdrawDepositTo(address target, uint256 amount);
    }
}

/// Decoded form of a user operation's `call_data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountCall {
    /// Generic call: transfer `value` from the account to `target`, carrying
    /// an opaque payload.
    Execute {
        target: Address,
        value: U256,
        data: Bytes,
    },
    /// Move `amount` out of the account's entry-point deposit into `target`'s
    /// balance.
    WithdrawDepositTo { target: Address, amount: U256 },
}

impl AccountCall {
    pub fn abi_encode(&self) -> Bytes {
        match self {
            Self::Execute {
                target,
                value,
                data,
            } => IBlessedAccount::executeCall {
                target: *target,
                value: *value,
                data: data.clone(),
            }
            .abi_encode()
            .into(),
            Self::WithdrawDepositTo { target, amount } => {
                IBlessedAccount::withdrawDepositToCall {
                    target: *target,
                    amount: *amount,
                }
                .abi_encode()
                .into()
            }
        }
    }

    /// Decodes a user operation payload. Empty call data is a validated
    /// no-op; anything else must be a known account call.
    pub fn abi_decode(data: &[u8]) -> Result<Option<Self>, WalletError> {
        if data.is_empty() {
            return Ok(None);
        }
        let call = IBlessedAccount::IBlessedAccountCalls::abi_decode(data)
            .map_err(|_| WalletError::CallDataInvalid)?;
        Ok(Some(match call {
            IBlessedAccount::IBlessedAccountCalls::execute(call) => Self::Execute {
                target: call.target,
                value: call.value,
                data: call.data,
            },
            IBlessedAccount::IBlessedAccountCalls::withdrawDepositTo(call) => {
                Self::WithdrawDepositTo {
                    target: call.target,
                    amount: call.amount,
                }
            }
        }))
    }
}
