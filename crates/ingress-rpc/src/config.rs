use std::net::{IpAddr, SocketAddr};

use alloy_primitives::{Address, U256};
use clap::Parser;

/// Runtime configuration for the wallet ingress service.
#[derive(Parser, Debug, Clone)]
pub struct Config {
    /// Address to bind the RPC server to
    #[arg(long, env = "BLESSED_INGRESS_ADDRESS", default_value = "0.0.0.0")]
    pub address: IpAddr,

    /// Port to bind the RPC server to
    #[arg(long, env = "BLESSED_INGRESS_PORT", default_value = "8080")]
    pub port: u16,

    /// Address the Prometheus exporter listens on
    #[arg(
        long,
        env = "BLESSED_INGRESS_METRICS_ADDR",
        default_value = "0.0.0.0:9000"
    )]
    pub metrics_addr: SocketAddr,

    #[arg(long, env = "BLESSED_INGRESS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Chain id every signed operation is scoped to
    #[arg(long, env = "BLESSED_CHAIN_ID", default_value = "1")]
    pub chain_id: u64,

    /// Entry point address of this execution context
    #[arg(long, env = "BLESSED_ENTRY_POINT")]
    pub entry_point: Address,

    /// Factory address account derivation is keyed by
    #[arg(long, env = "BLESSED_FACTORY")]
    pub factory: Address,

    /// Relayer identity published by the beacon
    #[arg(long, env = "BLESSED_RELAYER")]
    pub relayer: Address,

    /// Native float seeded to the relayer, drawn on for funded account
    /// creation and deposits
    #[arg(
        long,
        env = "BLESSED_RELAYER_FLOAT",
        default_value = "1000000000000000000"
    )]
    pub relayer_float: U256,
}
