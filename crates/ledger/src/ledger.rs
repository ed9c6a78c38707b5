//! The wallet ledger: native balances, deployed accounts, and the entry
//! point's deposit bookkeeping, mutated only through validated operations.

use alloy_primitives::{Address, B256, U256, map::HashMap};
use blessed_core::{AccountCall, UserOperation, WalletError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::account::BlessedAccount;
use crate::beacon::Beacon;
use crate::factory::AccountFactory;

/// Static configuration of one execution context. Every signed operation is
/// scoped to this (entry point, chain id) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    pub entry_point: Address,
    pub chain_id: u64,
    pub factory: Address,
    pub relayer: Address,
}

/// Proof that a validated user operation authorizes privileged calls made on
/// behalf of `account` while it executes. Only the ledger can mint one, and
/// only after validation has succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallAuthorization {
    account: Address,
    op_hash: B256,
}

impl CallAuthorization {
    pub const fn account(&self) -> Address {
        self.account
    }

    pub const fn op_hash(&self) -> B256 {
        self.op_hash
    }
}

/// Outcome of a fully applied user operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOpReceipt {
    pub op_hash: B256,
    pub nonce: U256,
    pub prefund_paid: U256,
}

/// Single-writer protocol state. Each operation is applied atomically:
/// every fallible check runs before the first mutation, so a rejected
/// operation leaves balances, deposits, and nonces untouched.
#[derive(Debug)]
pub struct WalletLedger {
    entry_point: Address,
    chain_id: u64,
    beacon: Beacon,
    factory: AccountFactory,
    accounts: HashMap<Address, BlessedAccount>,
    balances: HashMap<Address, U256>,
    deposits: HashMap<Address, U256>,
}

impl WalletLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            entry_point: config.entry_point,
            chain_id: config.chain_id,
            beacon: Beacon::new(config.relayer),
            factory: AccountFactory::new(config.factory, config.entry_point, config.relayer),
            accounts: HashMap::default(),
            balances: HashMap::default(),
            deposits: HashMap::default(),
        }
    }

    pub const fn entry_point(&self) -> Address {
        self.entry_point
    }

    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub const fn beacon(&self) -> &Beacon {
        &self.beacon
    }

    pub const fn factory(&self) -> &AccountFactory {
        &self.factory
    }

    pub fn account(&self, address: Address) -> Option<&BlessedAccount> {
        self.accounts.get(&address)
    }

    pub fn is_deployed(&self, address: Address) -> bool {
        self.accounts.contains_key(&address)
    }

    /// Funds an address out of thin air. Genesis and test seeding only; the
    /// protocol itself never mints.
    pub fn credit(&mut self, address: Address, amount: U256) {
        let balance = self.balances.entry(address).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn balance_of(&self, address: Address) -> U256 {
        self.balances.get(&address).copied().unwrap_or_default()
    }

    /// Entry-point-held deposit for `account`, distinct from its native
    /// balance.
    pub fn deposit_of(&self, account: Address) -> U256 {
        self.deposits.get(&account).copied().unwrap_or_default()
    }

    /// Aggregate of all per-account deposits. Always equals the entry
    /// point's own native balance.
    pub fn total_deposits(&self) -> U256 {
        self.deposits
            .values()
            .fold(U256::ZERO, |sum, deposit| sum.saturating_add(*deposit))
    }

    /// Pure derivation of the account address for (platform, user id),
    /// identical before and after deployment.
    pub fn account_address(&self, platform: &str, user_id: &str) -> Address {
        self.factory.account_address(platform, user_id)
    }

    /// Idempotent deterministic deployment. The first call deploys at the
    /// derived address with nonce zero; later identical calls are no-ops
    /// returning the same address. Attached funding is debited from `from`
    /// and credited to the account's entry-point deposit, never to its
    /// native balance.
    pub fn create_account(
        &mut self,
        from: Address,
        platform: &str,
        user_id: &str,
        funding: U256,
    ) -> Result<Address, WalletError> {
        let target = self.factory.account_address(platform, user_id);

        if funding > U256::ZERO {
            let available = self.balance_of(from);
            if available < funding {
                return Err(WalletError::InsufficientFunds {
                    needed: funding,
                    available,
                });
            }
        }

        if !self.accounts.contains_key(&target) {
            let account = BlessedAccount::new(
                target,
                self.entry_point,
                self.beacon.relayer(),
                platform,
                user_id,
            );
            self.accounts.insert(target, account);
            info!(
                message = "deployed account",
                account = %target,
                platform = platform,
                user_id = user_id,
            );
        }

        if funding > U256::ZERO {
            self.debit(from, funding);
            self.hold_deposit(target, funding);
        }

        Ok(target)
    }

    /// Credits `amount` from `from`'s native balance to `account`'s deposit.
    pub fn deposit_to(
        &mut self,
        from: Address,
        account: Address,
        amount: U256,
    ) -> Result<U256, WalletError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(WalletError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        self.debit(from, amount);
        self.hold_deposit(account, amount);
        Ok(self.deposit_of(account))
    }

    /// Account-level validation entry, caller-restricted to the account's
    /// configured entry point. On success the account has paid `caller`
    /// exactly `missing_account_funds` and consumed one nonce; on failure
    /// nothing changed.
    pub fn validate_user_op(
        &mut self,
        caller: Address,
        op: &UserOperation,
        op_hash: B256,
        missing_account_funds: U256,
    ) -> Result<U256, WalletError> {
        let account = self
            .accounts
            .get(&op.sender)
            .ok_or(WalletError::UnknownAccount(op.sender))?;
        account.check_user_op(caller, op, op_hash)?;

        let available = self.balance_of(op.sender);
        if available < missing_account_funds {
            return Err(WalletError::InsufficientFunds {
                needed: missing_account_funds,
                available,
            });
        }

        // commit
        if let Some(account) = self.accounts.get_mut(&op.sender) {
            account.advance_nonce();
        }
        self.debit(op.sender, missing_account_funds);
        self.credit(caller, missing_account_funds);
        debug!(
            message = "validated user operation",
            sender = %op.sender,
            op_hash = %op_hash,
            paid = %missing_account_funds,
        );
        Ok(missing_account_funds)
    }

    /// Full entry-point flow: hash the operation for this execution context,
    /// collect the missing prefund into the account's deposit, then run the
    /// execution payload. Pre-flighted end to end; a failure at any step
    /// leaves no partial state.
    pub fn handle_user_operation(
        &mut self,
        op: &UserOperation,
        gas_price: U256,
    ) -> Result<UserOpReceipt, WalletError> {
        let sender = op.sender;
        let op_hash = op.hash(self.entry_point, self.chain_id);
        let deposit = self.deposit_of(sender);
        let missing = op.required_prefund(gas_price).saturating_sub(deposit);

        let account = self
            .accounts
            .get(&sender)
            .ok_or(WalletError::UnknownAccount(sender))?;
        account.check_user_op(self.entry_point, op, op_hash)?;

        let balance = self.balance_of(sender);
        if balance < missing {
            return Err(WalletError::InsufficientFunds {
                needed: missing,
                available: balance,
            });
        }

        let call = AccountCall::abi_decode(&op.call_data)?;
        match &call {
            Some(AccountCall::Execute { value, .. }) => {
                let available = balance - missing;
                if available < *value {
                    return Err(WalletError::InsufficientFunds {
                        needed: *value,
                        available,
                    });
                }
            }
            Some(AccountCall::WithdrawDepositTo { amount, .. }) => {
                // the prefund is already held as deposit by the time the
                // payload runs
                let held = deposit.saturating_add(missing);
                if held < *amount {
                    return Err(WalletError::InsufficientFunds {
                        needed: *amount,
                        available: held,
                    });
                }
            }
            None => {}
        }

        // commit: the prefund payment goes to the entry point, which holds
        // it as the account's deposit
        if let Some(account) = self.accounts.get_mut(&sender) {
            account.advance_nonce();
        }
        self.debit(sender, missing);
        self.hold_deposit(sender, missing);

        let auth = CallAuthorization {
            account: sender,
            op_hash,
        };
        match call {
            Some(AccountCall::Execute {
                target,
                value,
                data,
            }) => self.execute(&auth, target, value, &data),
            Some(AccountCall::WithdrawDepositTo { target, amount }) => {
                self.withdraw_deposit_to(&auth, target, amount);
            }
            None => {}
        }

        let nonce = op.nonce;
        info!(
            message = "handled user operation",
            sender = %sender,
            op_hash = %op_hash,
            nonce = %nonce,
            prefund_paid = %missing,
        );
        Ok(UserOpReceipt {
            op_hash,
            nonce,
            prefund_paid: missing,
        })
    }

    // Execution payload steps below run only under a CallAuthorization and
    // after pre-flight, so they cannot fail mid-way.

    fn execute(&mut self, auth: &CallAuthorization, target: Address, value: U256, data: &[u8]) {
        self.debit(auth.account, value);
        self.credit(target, value);
        debug!(
            message = "executed account call",
            account = %auth.account,
            op_hash = %auth.op_hash,
            target = %target,
            value = %value,
            data_len = data.len(),
        );
    }

    fn withdraw_deposit_to(&mut self, auth: &CallAuthorization, target: Address, amount: U256) {
        let deposit = self.deposits.entry(auth.account).or_default();
        *deposit = deposit.saturating_sub(amount);
        self.debit(self.entry_point, amount);
        self.credit(target, amount);
        debug!(
            message = "withdrew deposit",
            account = %auth.account,
            op_hash = %auth.op_hash,
            target = %target,
            amount = %amount,
        );
    }

    // Callers pre-check sufficiency; saturation here is belt only.
    fn debit(&mut self, address: Address, amount: U256) {
        let balance = self.balances.entry(address).or_default();
        *balance = balance.saturating_sub(amount);
    }

    fn hold_deposit(&mut self, account: Address, amount: U256) {
        let deposit = self.deposits.entry(account).or_default();
        *deposit = deposit.saturating_add(amount);
        let held = self.balances.entry(self.entry_point).or_default();
        *held = held.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::utils::parse_ether;
    use alloy_signer_local::PrivateKeySigner;
    use blessed_core::test_utils::{sign_user_op, user_op_defaults};

    const CHAIN_ID: u64 = 1337;

    fn ledger(relayer: &PrivateKeySigner) -> WalletLedger {
        WalletLedger::new(LedgerConfig {
            entry_point: Address::new([0xe9; 20]),
            chain_id: CHAIN_ID,
            factory: Address::new([0x0f; 20]),
            relayer: relayer.address(),
        })
    }

    #[test]
    fn create_account_is_idempotent() {
        let relayer = PrivateKeySigner::random();
        let mut ledger = ledger(&relayer);
        let operator = Address::new([0x01; 20]);

        let target = ledger.account_address("telegram", "omnus");
        assert!(!ledger.is_deployed(target));

        let first = ledger
            .create_account(operator, "telegram", "omnus", U256::ZERO)
            .unwrap();
        assert_eq!(first, target);
        assert!(ledger.is_deployed(target));
        assert_eq!(ledger.account(target).unwrap().nonce(), U256::ZERO);

        let second = ledger
            .create_account(operator, "telegram", "omnus", U256::ZERO)
            .unwrap();
        assert_eq!(second, target);
    }

    #[test]
    fn funded_creation_credits_the_deposit_not_the_account() {
        let relayer = PrivateKeySigner::random();
        let mut ledger = ledger(&relayer);
        let operator = Address::new([0x01; 20]);
        let funding = parse_ether("1").unwrap();
        ledger.credit(operator, funding);

        let target = ledger
            .create_account(operator, "telegram", "omnus", funding)
            .unwrap();

        assert_eq!(ledger.deposit_of(target), funding);
        assert_eq!(ledger.balance_of(target), U256::ZERO);
        assert_eq!(ledger.balance_of(operator), U256::ZERO);
        assert_eq!(ledger.balance_of(ledger.entry_point()), funding);
    }

    #[test]
    fn unfunded_operator_cannot_attach_value() {
        let relayer = PrivateKeySigner::random();
        let mut ledger = ledger(&relayer);
        let operator = Address::new([0x01; 20]);

        let err = ledger
            .create_account(operator, "telegram", "omnus", U256::from(1))
            .unwrap_err();
        assert_eq!(
            err,
            WalletError::InsufficientFunds {
                needed: U256::from(1),
                available: U256::ZERO,
            }
        );
        assert!(!ledger.is_deployed(ledger.account_address("telegram", "omnus")));
    }

    #[test]
    fn validate_rejects_unknown_senders() {
        let relayer = PrivateKeySigner::random();
        let mut ledger = ledger(&relayer);
        let entry_point = ledger.entry_point();

        let op = sign_user_op(
            user_op_defaults(Address::new([0x77; 20])),
            &relayer,
            entry_point,
            CHAIN_ID,
        );
        let op_hash = op.hash(entry_point, CHAIN_ID);

        assert_eq!(
            ledger.validate_user_op(entry_point, &op, op_hash, U256::ZERO),
            Err(WalletError::UnknownAccount(op.sender))
        );
    }

    #[test]
    fn same_nonce_cannot_be_spent_twice() {
        let relayer = PrivateKeySigner::random();
        let mut ledger = ledger(&relayer);
        let entry_point = ledger.entry_point();
        let operator = Address::new([0x01; 20]);

        let account = ledger
            .create_account(operator, "telegram", "omnus", U256::ZERO)
            .unwrap();
        ledger.credit(account, parse_ether("1").unwrap());

        let op = sign_user_op(
            user_op_defaults(account),
            &relayer,
            entry_point,
            CHAIN_ID,
        );
        let op_hash = op.hash(entry_point, CHAIN_ID);

        ledger
            .validate_user_op(entry_point, &op, op_hash, U256::ZERO)
            .unwrap();
        assert_eq!(
            ledger.validate_user_op(entry_point, &op, op_hash, U256::ZERO),
            Err(WalletError::NonceMismatch {
                expected: U256::from(1),
                got: U256::ZERO,
            })
        );
    }
}
