//! Chat Relay - Entry Point
//!
//! Loads configuration, starts the ChatServer actor and accepts
//! connections until Ctrl-C.

use std::env;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_relay::{run_acceptor, ChatServer, Config, ConnectionSettings};

/// Environment variable overriding the configured listen address
const LISTEN_ENV: &str = "CHAT_RELAY_LISTEN";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    // Config file path from command line, defaults otherwise
    let mut config = match env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            Config::load(&path)?
        }
        None => Config::default(),
    };
    if let Ok(listen) = env::var(LISTEN_ENV) {
        config.listen = listen;
    }

    // Start TCP listener
    let listener = TcpListener::bind(&config.listen).await?;
    info!("Chat relay listening on {}", config.listen);

    // Create ChatServer actor channel and start
    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer);
    let server = ChatServer::with_policy(cmd_rx, config.duplicate_names);
    tokio::spawn(server.run());

    info!("ChatServer actor started");

    // Cancel everything on Ctrl-C
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                signal_token.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    run_acceptor(listener, cmd_tx, ConnectionSettings::from(&config), shutdown).await?;

    info!("Chat relay stopped");
    Ok(())
}
