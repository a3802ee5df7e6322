//! Klok Registrar - Entry point.

use klok_client::KlokClient;
use klok_registrar::{input, Config, ProxyPool, Registrar, ResultSink};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log.level);

    info!(
        "Klok registration started at {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    let keys = match input::read_lines(&config.files.keys).await {
        Ok(keys) => keys,
        Err(e) => {
            error!("Failed to read private keys: {}", e);
            std::process::exit(1);
        }
    };
    info!("Loaded {} private keys", keys.len());

    let proxies = input::load_proxy_pool(&config.files.proxies).await;

    let sink = match ResultSink::create(&config.files.success, &config.files.failure).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to create output files: {}", e);
            std::process::exit(1);
        }
    };

    let client = match KlokClient::new(config.client_options()) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to create Klok client: {}", e);
            std::process::exit(1);
        }
    };
    info!("Klok API endpoint: {}", client.base_url());

    let registrar = Registrar::new(client, sink, config.run_settings());
    let summary = registrar.run(keys, Arc::new(proxies)).await;

    info!(
        "Done: {} registered, {} failed, {} invalid keys, {} errors",
        summary.registered, summary.failed, summary.rejected, summary.errored
    );
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
