//! TCP accept loop
//!
//! Hands every accepted socket to its own connection task and returns
//! once the shutdown token fires and every connection has torn down.

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::handler::{handle_connection, ConnectionSettings};
use crate::server::ServerCommand;

/// Accept connections until `shutdown` is cancelled
pub async fn run_acceptor(
    listener: TcpListener,
    cmd_tx: mpsc::Sender<ServerCommand>,
    settings: ConnectionSettings,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let mut connections = JoinSet::new();

    loop {
        // Reap finished connection tasks
        while connections.try_join_next().is_some() {}

        let accepted = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();
                let settings = settings.clone();
                let shutdown = shutdown.clone();

                connections.spawn(async move {
                    let peer = addr.to_string();
                    let result = handle_connection(stream, peer, cmd_tx, settings, shutdown).await;
                    if let Err(e) = result {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }

    info!("Stopped accepting, draining {} connections", connections.len());
    while connections.join_next().await.is_some() {}
    debug!("All connections closed");

    Ok(())
}
