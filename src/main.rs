//! Multiplayer Presence Relay - Entry Point
//!
//! Starts the TCP listener and RelayServer actor, accepting connections.

use std::env;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use presence_relay::{serve, RelayServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=presence_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("presence_relay=info")),
        )
        .init();

    let mut config = ServerConfig::from_env()?;

    // Bind address from command line overrides the environment
    if let Some(addr) = env::args().nth(1) {
        config.listen_addr = addr;
    }

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!("Server running on {}", config.listen_addr);

    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer);
    tokio::spawn(RelayServer::new(cmd_rx).run());

    serve(listener, cmd_tx).await;

    Ok(())
}
