pub mod config;
pub mod metrics;
pub mod service;

pub use config::Config;
pub use service::{CreateAccountRequest, CreateAccountResponse, WalletApiServer, WalletService};
