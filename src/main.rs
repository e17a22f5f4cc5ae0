//! Chat Relay - Entry Point
//!
//! Starts the TCP listener and ChatServer actor, accepting connections.

use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::{accept_loop, ChatServer, Config};

/// Channel buffer size for server commands
const CHANNEL_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    // Listen port from the command line, or the default
    let config = Arc::new(Config::from_args(env::args().skip(1))?);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("The chat server is running on {}", config.bind_addr());

    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    tokio::spawn(ChatServer::new(cmd_rx).run());

    info!("ChatServer actor started");

    accept_loop(listener, cmd_tx, config).await;

    Ok(())
}
