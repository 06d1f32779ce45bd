use core::net::SocketAddrV4;
use std::env;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or(EnvFilter::new("debug,h2=warn,hyper_util=warn,tower=info"));
    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}

/// Installs the Prometheus exporter on `METRICS_ADDR` (default `0.0.0.0:9002`).
pub fn init_metrics() -> anyhow::Result<()> {
    let addr = env::var("METRICS_ADDR").unwrap_or_else(|_| "0.0.0.0:9002".to_string());
    Ok(PrometheusBuilder::new()
        .with_http_listener(addr.parse::<SocketAddrV4>()?)
        .install()?)
}
