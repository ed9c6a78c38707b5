//! In-process model of the Blessed wallet protocol: deployed accounts, the
//! deterministic factory, and the entry point's deposit ledger.

pub mod account;
pub mod beacon;
pub mod factory;
pub mod ledger;

pub use account::BlessedAccount;
pub use beacon::Beacon;
pub use factory::AccountFactory;
pub use ledger::{CallAuthorization, LedgerConfig, UserOpReceipt, WalletLedger};
