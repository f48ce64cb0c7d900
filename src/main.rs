//! TCP Chat Relay Server - Entry Point
//!
//! Loads configuration, starts the operator console task, and runs the
//! accept loop.

use std::env;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::{config, console, Config, Relay};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    // Bind address and banner path from the command line
    let cfg = Config::from_args(env::args().skip(1));
    let banner = config::load_banner(&cfg.banner_path);

    let listener = TcpListener::bind(&cfg.addr).await?;
    info!("chat relay listening on {}", cfg.addr);

    let relay = Relay::new(&banner);

    // Operator console: /kick <name>, anything else broadcasts
    tokio::spawn(console::run(relay.clone()));

    relay.run(listener).await;

    Ok(())
}
