//! Builders for signed user operations, shared by the workspace test suites.

use alloy_primitives::{Address, Bytes, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use crate::user_operation::UserOperation;

/// An unsigned operation with the default gas terms the wallet test suites
/// use throughout.
pub fn user_op_defaults(sender: Address) -> UserOperation {
    UserOperation {
        sender,
        nonce: U256::ZERO,
        init_code: Bytes::new(),
        call_data: Bytes::new(),
        call_gas_limit: U256::from(200_000u64),
        verification_gas_limit: U256::from(100_000u64),
        pre_verification_gas: U256::from(21_000u64),
        max_fee_per_gas: U256::from(3_000_000_000u64),
        max_priority_fee_per_gas: U256::from(1_000_000_000u64),
        paymaster_and_data: Bytes::new(),
        signature: Bytes::new(),
    }
}

/// Signs `op` for the given execution context, EIP-191 over the operation
/// hash, and returns it with the signature attached.
pub fn sign_user_op(
    mut op: UserOperation,
    signer: &PrivateKeySigner,
    entry_point: Address,
    chain_id: u64,
) -> UserOperation {
    let op_hash = op.hash(entry_point, chain_id);
    let signature = signer
        .sign_message_sync(op_hash.as_slice())
        .expect("in-memory signer");
    op.signature = Bytes::from(signature.as_bytes().to_vec());
    op
}
