use stamp_aggregator::{
    api::Server,
    batch::LoggingProcessor,
    clock::SystemClock,
    config::Config,
    RequestAggregator,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// The main entry point for the stamp aggregator service.
///
/// Initializes logging, loads the configuration, starts the aggregator's
/// flush loop and serves the HTTP API until Ctrl-C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default `info` level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // First CLI argument overrides the default config path
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/default.toml".to_string());
    let config = Config::load(&path)?;
    info!("Stamp aggregator starting with config: {:?}", config);

    // Flushing starts as soon as the aggregator exists
    let aggregator = Arc::new(RequestAggregator::new(
        config.aggregator.clone(),
        Arc::new(LoggingProcessor),
        Arc::new(SystemClock),
    ));

    let server = Server::new(config.api.clone(), aggregator.clone());
    let result = server.start().await;

    aggregator.stop_processing();
    let pending: usize = aggregator
        .open_batches()
        .await
        .iter()
        .map(|batch| batch.len())
        .sum();
    if pending > 0 {
        info!("Shutting down with {} requests still waiting in open batches", pending);
    }

    result
}
