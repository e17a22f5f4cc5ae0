//! Connection acceptor
//!
//! Accepts TCP connections and spawns one handler task per client.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::Config;
use crate::handler::handle_connection;
use crate::server::ServerCommand;

/// Accept connections forever
///
/// Neither accept errors nor failed sessions stop the loop.
pub async fn accept_loop(
    listener: TcpListener,
    cmd_tx: mpsc::Sender<ServerCommand>,
    config: Arc<Config>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();
                let config = Arc::clone(&config);

                // Spawn handler task for each connection
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx, config).await {
                        error!("Connection handler error for {}: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
