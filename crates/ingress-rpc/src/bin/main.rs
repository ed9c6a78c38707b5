use blessed_core::logger::init_logger;
use blessed_ingress_rpc::service::{WalletApiServer, WalletService};
use blessed_ingress_rpc::{Config, metrics::init_prometheus_exporter};
use blessed_ledger::{LedgerConfig, WalletLedger};
use clap::Parser;
use jsonrpsee::server::Server;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::parse();

    init_logger(&config.log_level);

    init_prometheus_exporter(config.metrics_addr).expect("Failed to install Prometheus exporter");

    info!(
        message = "Starting wallet ingress service",
        address = %config.address,
        port = config.port,
        chain_id = config.chain_id,
        entry_point = %config.entry_point,
        factory = %config.factory,
        relayer = %config.relayer,
        metrics_address = %config.metrics_addr,
    );

    let mut ledger = WalletLedger::new(LedgerConfig {
        entry_point: config.entry_point,
        chain_id: config.chain_id,
        factory: config.factory,
        relayer: config.relayer,
    });
    // the relayer fronts funded creations and deposits out of this float
    ledger.credit(config.relayer, config.relayer_float);

    let service = WalletService::new(ledger, config.relayer);
    let bind_addr = format!("{}:{}", config.address, config.port);

    let server = Server::builder().build(&bind_addr).await?;
    let addr = server.local_addr()?;
    let handle = server.start(service.into_rpc());

    info!(
        message = "Wallet ingress RPC server started",
        address = %addr
    );

    handle.stopped().await;
    Ok(())
}
