//! Per-user smart account state.

use alloy_primitives::{Address, B256, U256};
use blessed_core::{UserOperation, WalletError};

/// A deployed Blessed account. The entry point and relayer are injected at
/// construction, never read from ambient state; every privileged call is
/// checked against them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlessedAccount {
    address: Address,
    entry_point: Address,
    relayer: Address,
    platform: String,
    user_id: String,
    nonce: U256,
}

impl BlessedAccount {
    pub(crate) fn new(
        address: Address,
        entry_point: Address,
        relayer: Address,
        platform: &str,
        user_id: &str,
    ) -> Self {
        Self {
            address,
            entry_point,
            relayer,
            platform: platform.to_owned(),
            user_id: user_id.to_owned(),
            nonce: U256::ZERO,
        }
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    pub const fn entry_point(&self) -> Address {
        self.entry_point
    }

    pub const fn relayer(&self) -> Address {
        self.relayer
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Next nonce this account will accept.
    pub const fn nonce(&self) -> U256 {
        self.nonce
    }

    /// Checks an incoming operation without touching any state: caller
    /// restriction, relayer signature over the presented `op_hash`, then the
    /// nonce. Check order is observable through the returned error and is
    /// part of the boundary contract: a tampered operation fails signature
    /// recovery (`relay only`) before its nonce is ever inspected.
    pub fn check_user_op(
        &self,
        caller: Address,
        op: &UserOperation,
        op_hash: B256,
    ) -> Result<(), WalletError> {
        if caller != self.entry_point {
            return Err(WalletError::NotEntryPoint);
        }
        if op.recover_signer(op_hash)? != self.relayer {
            return Err(WalletError::SignatureInvalid);
        }
        if op.nonce != self.nonce {
            return Err(WalletError::NonceMismatch {
                expected: self.nonce,
                got: op.nonce,
            });
        }
        Ok(())
    }

    pub(crate) fn advance_nonce(&mut self) {
        self.nonce += U256::from(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_signer_local::PrivateKeySigner;
    use blessed_core::test_utils::{sign_user_op, user_op_defaults};

    const CHAIN_ID: u64 = 1337;

    fn deployed_account(relayer: &PrivateKeySigner, entry_point: Address) -> BlessedAccount {
        BlessedAccount::new(
            Address::new([0xbe; 20]),
            entry_point,
            relayer.address(),
            "telegram",
            "omnus",
        )
    }

    #[test]
    fn accepts_a_relayer_signed_operation() {
        let relayer = PrivateKeySigner::random();
        let entry_point = Address::new([0xe9; 20]);
        let account = deployed_account(&relayer, entry_point);

        let op = sign_user_op(
            user_op_defaults(account.address()),
            &relayer,
            entry_point,
            CHAIN_ID,
        );
        let op_hash = op.hash(entry_point, CHAIN_ID);

        account.check_user_op(entry_point, &op, op_hash).unwrap();
    }

    #[test]
    fn rejects_callers_other_than_the_entry_point() {
        let relayer = PrivateKeySigner::random();
        let entry_point = Address::new([0xe9; 20]);
        let account = deployed_account(&relayer, entry_point);

        let op = sign_user_op(
            user_op_defaults(account.address()),
            &relayer,
            entry_point,
            CHAIN_ID,
        );
        let op_hash = op.hash(entry_point, CHAIN_ID);

        assert_eq!(
            account.check_user_op(Address::new([0x01; 20]), &op, op_hash),
            Err(WalletError::NotEntryPoint)
        );
    }

    #[test]
    fn rejects_a_foreign_signer_with_relay_only() {
        let relayer = PrivateKeySigner::random();
        let intruder = PrivateKeySigner::random();
        let entry_point = Address::new([0xe9; 20]);
        let account = deployed_account(&relayer, entry_point);

        let op = sign_user_op(
            user_op_defaults(account.address()),
            &intruder,
            entry_point,
            CHAIN_ID,
        );
        let op_hash = op.hash(entry_point, CHAIN_ID);

        let err = account.check_user_op(entry_point, &op, op_hash).unwrap_err();
        assert_eq!(err, WalletError::SignatureInvalid);
        assert_eq!(err.to_string(), "relay only");
    }

    #[test]
    fn tampered_hash_fails_before_the_nonce_is_checked() {
        let relayer = PrivateKeySigner::random();
        let entry_point = Address::new([0xe9; 20]);
        let account = deployed_account(&relayer, entry_point);

        let mut op = sign_user_op(
            user_op_defaults(account.address()),
            &relayer,
            entry_point,
            CHAIN_ID,
        );
        op.nonce = U256::from(1);

        // presenting the zero hash: the signature cannot recover the relayer
        assert_eq!(
            account.check_user_op(entry_point, &op, B256::ZERO),
            Err(WalletError::SignatureInvalid)
        );
    }

    #[test]
    fn rejects_a_stale_nonce() {
        let relayer = PrivateKeySigner::random();
        let entry_point = Address::new([0xe9; 20]);
        let mut account = deployed_account(&relayer, entry_point);
        account.advance_nonce();

        let op = sign_user_op(
            user_op_defaults(account.address()),
            &relayer,
            entry_point,
            CHAIN_ID,
        );
        let op_hash = op.hash(entry_point, CHAIN_ID);

        assert_eq!(
            account.check_user_op(entry_point, &op, op_hash),
            Err(WalletError::NonceMismatch {
                expected: U256::from(1),
                got: U256::ZERO,
            })
        );
    }

    #[test]
    fn signature_for_another_chain_is_rejected() {
        let relayer = PrivateKeySigner::random();
        let entry_point = Address::new([0xe9; 20]);
        let account = deployed_account(&relayer, entry_point);

        let op = sign_user_op(
            user_op_defaults(account.address()),
            &relayer,
            entry_point,
            CHAIN_ID + 1,
        );
        let op_hash = op.hash(entry_point, CHAIN_ID);

        assert_eq!(
            account.check_user_op(entry_point, &op, op_hash),
            Err(WalletError::SignatureInvalid)
        );
    }
}
