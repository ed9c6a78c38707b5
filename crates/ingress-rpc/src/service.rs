use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use alloy_primitives::{Address, U256};
use blessed_core::{UserOperation, WalletError};
use blessed_ledger::{UserOpReceipt, WalletLedger};
use jsonrpsee::{
    core::{RpcResult, async_trait},
    proc_macros::rpc,
    types::{ErrorObject, ErrorObjectOwned},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::metrics::RpcMetrics;

// Error codes exposed at the RPC boundary, one per failure kind so clients
// can dispatch without parsing reason strings.
const CODE_NOT_ENTRY_POINT: i32 = -32010;
const CODE_SIGNATURE_INVALID: i32 = -32011;
const CODE_NONCE_MISMATCH: i32 = -32012;
const CODE_INSUFFICIENT_FUNDS: i32 = -32013;
const CODE_CALL_DATA_INVALID: i32 = -32014;
const CODE_UNKNOWN_ACCOUNT: i32 = -32015;

fn wallet_rpc_err(error: &WalletError) -> ErrorObjectOwned {
    let code = match error {
        WalletError::NotEntryPoint => CODE_NOT_ENTRY_POINT,
        WalletError::SignatureInvalid => CODE_SIGNATURE_INVALID,
        WalletError::NonceMismatch { .. } => CODE_NONCE_MISMATCH,
        WalletError::InsufficientFunds { .. } => CODE_INSUFFICIENT_FUNDS,
        WalletError::CallDataInvalid => CODE_CALL_DATA_INVALID,
        WalletError::UnknownAccount(_) => CODE_UNKNOWN_ACCOUNT,
    };
    ErrorObject::owned(code, error.to_string(), None::<()>)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub platform: String,
    pub user_id: String,
    /// Value attached to the creation, credited to the account's entry-point
    /// deposit.
    #[serde(default)]
    pub funding: U256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountResponse {
    pub account: Address,
    pub deposit: U256,
    /// False when the account already existed and the call was a no-op.
    pub created: bool,
}

#[rpc(server, namespace = "bless")]
pub trait WalletApi {
    /// Pure derivation of the account address for (platform, userId),
    /// callable before the account exists.
    #[method(name = "accountAddress")]
    async fn account_address(&self, platform: String, user_id: String) -> RpcResult<Address>;

    /// Idempotent deterministic deployment, optionally funded from the
    /// relayer float.
    #[method(name = "createAccount")]
    async fn create_account(
        &self,
        request: CreateAccountRequest,
    ) -> RpcResult<CreateAccountResponse>;

    /// Validates and executes a relayer-signed user operation.
    #[method(name = "sendUserOperation")]
    async fn send_user_operation(&self, op: UserOperation) -> RpcResult<UserOpReceipt>;

    /// Entry-point-held deposit for `account`, distinct from its native
    /// balance.
    #[method(name = "getDeposit")]
    async fn get_deposit(&self, account: Address) -> RpcResult<U256>;

    /// Credits `amount` from the relayer float to `account`'s deposit and
    /// returns the new deposit.
    #[method(name = "depositTo")]
    async fn deposit_to(&self, account: Address, amount: U256) -> RpcResult<U256>;

    /// The (entry point, chain id) context operations must be signed for.
    #[method(name = "entryPoint")]
    async fn entry_point(&self) -> RpcResult<Address>;
}

pub struct WalletService {
    ledger: Arc<Mutex<WalletLedger>>,
    relayer: Address,
    metrics: RpcMetrics,
}

impl WalletService {
    pub fn new(ledger: WalletLedger, relayer: Address) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            relayer,
            metrics: RpcMetrics::default(),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, WalletLedger> {
        self.ledger.lock().unwrap()
    }
}

impl std::fmt::Debug for WalletService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletService")
            .field("relayer", &self.relayer)
            .finish()
    }
}

#[async_trait]
impl WalletApiServer for WalletService {
    async fn account_address(&self, platform: String, user_id: String) -> RpcResult<Address> {
        Ok(self.ledger().account_address(&platform, &user_id))
    }

    async fn create_account(
        &self,
        request: CreateAccountRequest,
    ) -> RpcResult<CreateAccountResponse> {
        let started = Instant::now();
        let relayer = self.relayer;

        let mut ledger = self.ledger();
        let target = ledger.account_address(&request.platform, &request.user_id);
        let created = !ledger.is_deployed(target);
        let account = ledger
            .create_account(relayer, &request.platform, &request.user_id, request.funding)
            .map_err(|e| {
                warn!(
                    message = "create_account rejected",
                    platform = %request.platform,
                    user_id = %request.user_id,
                    error = %e,
                );
                wallet_rpc_err(&e)
            })?;
        let deposit = ledger.deposit_of(account);
        drop(ledger);

        info!(
            message = "created account",
            account = %account,
            platform = %request.platform,
            user_id = %request.user_id,
            created = created,
            deposit = %deposit,
        );
        self.metrics
            .create_account_duration
            .record(started.elapsed().as_secs_f64());
        Ok(CreateAccountResponse {
            account,
            deposit,
            created,
        })
    }

    async fn send_user_operation(&self, op: UserOperation) -> RpcResult<UserOpReceipt> {
        let started = Instant::now();

        // the declared fee cap bounds the prefund the account must cover
        let gas_price = op.max_fee_per_gas;
        let receipt = self
            .ledger()
            .handle_user_operation(&op, gas_price)
            .map_err(|e| {
                warn!(
                    message = "user operation rejected",
                    sender = %op.sender,
                    nonce = %op.nonce,
                    error = %e,
                );
                wallet_rpc_err(&e)
            })?;

        info!(
            message = "user operation applied",
            sender = %op.sender,
            op_hash = %receipt.op_hash,
            prefund_paid = %receipt.prefund_paid,
        );
        self.metrics
            .send_user_operation_duration
            .record(started.elapsed().as_secs_f64());
        Ok(receipt)
    }

    async fn get_deposit(&self, account: Address) -> RpcResult<U256> {
        Ok(self.ledger().deposit_of(account))
    }

    async fn deposit_to(&self, account: Address, amount: U256) -> RpcResult<U256> {
        let relayer = self.relayer;
        self.ledger()
            .deposit_to(relayer, account, amount)
            .map_err(|e| wallet_rpc_err(&e))
    }

    async fn entry_point(&self) -> RpcResult<Address> {
        Ok(self.ledger().entry_point())
    }
}
