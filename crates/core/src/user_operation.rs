//! ERC-4337 style user operation type for Blessed accounts.

use alloy_primitives::{Address, B256, Bytes, Signature, U256, eip191_hash_message, keccak256};
use alloy_sol_types::{SolValue, sol};
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

sol! {
    struct EncodedUserOperation {
        address sender;
        uint256 nonce;
        bytes32 initCodeHash;
        bytes32 callDataHash;
        uint256 callGasLimit;
        uint256 verificationGasLimit;
        uint256 preVerificationGas;
        uint256 maxFeePerGas;
        uint256 maxPriorityFeePerGas;
        bytes32 paymasterAndDataHash;
    }

    struct UserOperationContext {
        bytes32 packedHash;
        address entryPoint;
        uint256 chainId;
    }
}

/// A signed, off-chain-constructed intent describing an action a Blessed
/// account should perform, paired with gas-payment terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

impl UserOperation {
    /// ABI-encodes the operation in its canonical form, with variable-length
    /// fields collapsed to their keccak256 hashes. The signature itself is
    /// not part of the encoding.
    pub fn encode(&self) -> Vec<u8> {
        let encoded = EncodedUserOperation {
            sender: self.sender,
            nonce: self.nonce,
            initCodeHash: keccak256(&self.init_code),
            callDataHash: keccak256(&self.call_data),
            callGasLimit: self.call_gas_limit,
            verificationGasLimit: self.verification_gas_limit,
            preVerificationGas: self.pre_verification_gas,
            maxFeePerGas: self.max_fee_per_gas,
            maxPriorityFeePerGas: self.max_priority_fee_per_gas,
            paymasterAndDataHash: keccak256(&self.paymaster_and_data),
        };
        encoded.abi_encode()
    }

    /// Hash binding the operation to one execution context. A signature over
    /// this hash is worthless for any other (entry point, chain id) pair.
    pub fn hash(&self, entry_point: Address, chain_id: u64) -> B256 {
        let context = UserOperationContext {
            packedHash: keccak256(self.encode()),
            entryPoint: entry_point,
            chainId: U256::from(chain_id),
        };
        keccak256(context.abi_encode())
    }

    /// EIP-191 digest the relayer signs for the given execution context.
    pub fn signing_digest(&self, entry_point: Address, chain_id: u64) -> B256 {
        eip191_hash_message(self.hash(entry_point, chain_id))
    }

    /// Recovers the address that signed `op_hash` (EIP-191 prefixed).
    pub fn recover_signer(&self, op_hash: B256) -> Result<Address, WalletError> {
        let signature = Signature::try_from(self.signature.as_ref())
            .map_err(|_| WalletError::SignatureInvalid)?;
        signature
            .recover_address_from_msg(op_hash)
            .map_err(|_| WalletError::SignatureInvalid)
    }

    /// Gas payment the account owes the entry point at `gas_price`, covering
    /// the declared call and verification gas limits.
    pub fn required_prefund(&self, gas_price: U256) -> U256 {
        self.call_gas_limit
            .saturating_add(self.verification_gas_limit)
            .saturating_mul(gas_price)
    }
}
