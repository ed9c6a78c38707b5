use std::net::SocketAddr;

use metrics::Histogram;
use metrics_derive::Metrics;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Metrics for the `blessed_ingress_rpc` component.
/// Conventions:
/// - Durations are recorded in seconds (histograms).
#[derive(Metrics, Clone)]
#[metrics(scope = "blessed_ingress_rpc")]
pub struct RpcMetrics {
    #[metric(describe = "Duration of create_account")]
    pub create_account_duration: Histogram,

    #[metric(describe = "Duration of send_user_operation")]
    pub send_user_operation_duration: Histogram,
}

pub fn init_prometheus_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    Ok(())
}
