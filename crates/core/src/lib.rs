pub mod calls;
pub mod error;
pub mod logger;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod user_operation;

pub use calls::AccountCall;
pub use error::WalletError;
pub use user_operation::UserOperation;
