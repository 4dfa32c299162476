//! Line-Oriented TCP Chat Relay Library
//!
//! A small chat relay: every client sends its display name as the first
//! line, then free text (relayed verbatim to everyone else) or
//! `@name body` (delivered to one client with a server-added prefix).
//!
//! # Features
//! - Broadcast and direct messages over newline-delimited text
//! - Join and departure notices
//! - Duplicate name rejection (configurable)
//! - Optional idle timeout
//! - Graceful shutdown via cancellation tokens
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the registry
//! - Each connection has a `handler` task plus a writer task
//! - No locks needed - all registry access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//! use chat_relay::{run_acceptor, ChatServer, ConnectionSettings};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(ChatServer::new(cmd_rx).run());
//!
//!     let shutdown = CancellationToken::new();
//!     run_acceptor(listener, cmd_tx, ConnectionSettings::default(), shutdown)
//!         .await
//!         .unwrap();
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod listener;
pub mod message;
pub mod peer;
pub mod registry;
pub mod router;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use config::{Config, ConfigError};
pub use error::{AppError, SendError};
pub use handler::{handle_connection, ConnectionSettings, ConnectionState};
pub use listener::run_acceptor;
pub use message::{ClientLine, ServerNotice};
pub use registry::Registry;
pub use router::Delivery;
pub use server::{ChatServer, ServerCommand};
pub use types::{ClientId, DuplicateNamePolicy};
