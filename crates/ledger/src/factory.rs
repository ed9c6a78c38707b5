//! Deterministic account address derivation.

use alloy_primitives::{Address, B256, keccak256};
use alloy_sol_types::SolValue;

/// Derives Blessed account addresses as a pure function of (platform, user
/// id) and the factory configuration, CREATE2 style. The same inputs yield
/// the same address before and after deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountFactory {
    address: Address,
    entry_point: Address,
    relayer: Address,
}

impl AccountFactory {
    pub const fn new(address: Address, entry_point: Address, relayer: Address) -> Self {
        Self {
            address,
            entry_point,
            relayer,
        }
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    /// The address `create_account(platform, user_id)` deploys to, callable
    /// as a read-only query before any deployment happens.
    pub fn account_address(&self, platform: &str, user_id: &str) -> Address {
        self.address
            .create2(self.salt(platform, user_id), self.init_code_hash())
    }

    fn salt(&self, platform: &str, user_id: &str) -> B256 {
        keccak256((platform, user_id).abi_encode())
    }

    // Accounts are constructed from the entry point and relayer, so both
    // feed the derivation.
    fn init_code_hash(&self) -> B256 {
        keccak256((self.entry_point, self.relayer).abi_encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> AccountFactory {
        AccountFactory::new(
            Address::new([0x0f; 20]),
            Address::new([0xe9; 20]),
            Address::new([0x99; 20]),
        )
    }

    #[test]
    fn derivation_is_stable() {
        let target = factory().account_address("telegram", "omnus");
        assert_eq!(target, factory().account_address("telegram", "omnus"));
    }

    #[test]
    fn distinct_identities_never_collide() {
        let f = factory();
        let a = f.account_address("telegram", "omnus");
        assert_ne!(a, f.account_address("telegram", "sumno"));
        assert_ne!(a, f.account_address("discord", "omnus"));
        // swapping the fields is a different identity too
        assert_ne!(a, f.account_address("omnus", "telegram"));
    }

    #[test]
    fn derivation_depends_on_factory_configuration() {
        let f = factory();
        let other_factory = AccountFactory::new(
            Address::new([0x10; 20]),
            Address::new([0xe9; 20]),
            Address::new([0x99; 20]),
        );
        let other_entry_point = AccountFactory::new(
            Address::new([0x0f; 20]),
            Address::new([0xea; 20]),
            Address::new([0x99; 20]),
        );
        let target = f.account_address("telegram", "omnus");
        assert_ne!(target, other_factory.account_address("telegram", "omnus"));
        assert_ne!(target, other_entry_point.account_address("telegram", "omnus"));
    }
}
