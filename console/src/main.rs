//! Browser Console
//!
//! Runs a terminal console whose remote commands are executed by a native
//! messaging host, reached through the console relay.

use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use console_relay::{ChannelManager, Config, NativeHostConnector, RelayRouter};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    // The terminal owns stdout, so logs go to a file
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(Mutex::new(log_file)))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(log_file)))
            .with(filter)
            .init();
    }

    info!("Starting Browser Console");
    info!("Native host: {}", config.host_name);

    let connector = Arc::new(NativeHostConnector::from_config(&config));
    let channel = Arc::new(ChannelManager::new(
        config.host_name.clone(),
        connector,
        config.event_capacity,
    ));
    let (router, client) = RelayRouter::new(channel, config.event_capacity);
    let router_handle = tokio::spawn(router.run());

    let result = browser_console::terminal::run(client).await;
    if let Err(e) = &result {
        error!("Console error: {}", e);
    }

    // Dropping the last client stops the router, which closes the host
    if let Err(e) = router_handle.await {
        error!("Relay router task failed: {}", e);
    }

    info!("Browser Console shutdown complete");
    result
}
