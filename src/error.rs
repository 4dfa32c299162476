//! Error types for the chat relay
//!
//! Defines connection-level errors and per-recipient delivery errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Application-level errors
///
/// Every variant is terminal for the one connection that hit it;
/// none of them is ever reported back to a remote peer.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on the transport
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error (oversized line or IO underneath)
    #[error("Line codec error: {0}")]
    Lines(#[from] LinesCodecError),

    /// Channel send error (fatal - ChatServer is gone)
    #[error("Channel send error")]
    ChannelSend,

    /// Display name already registered by another connection
    #[error("Name already taken: {0}")]
    NameTaken(String),

    /// No line arrived within the configured idle timeout
    #[error("Idle timeout elapsed")]
    IdleTimeout,
}

/// Message delivery errors
///
/// Occurs when enqueueing a line for one recipient fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The recipient's writer has gone away
    #[error("Channel closed")]
    ChannelClosed,
}
