//! Client struct definition
//!
//! Represents a registered connection: its identity, display name, the
//! queue feeding its writer task, and the token that tears it down.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::SendError;
use crate::types::ClientId;

/// Registered client information
///
/// Cheap to clone: every field is a handle. The connection task owns
/// the transport; the registry only holds this.
#[derive(Debug, Clone)]
pub struct Client {
    /// Unique identifier for this connection
    pub id: ClientId,
    /// Display name, fixed at registration
    pub name: String,
    /// Server → Client line queue, drained by the connection's writer
    pub sender: mpsc::UnboundedSender<String>,
    /// Cancelling this ends the connection's read loop and writer
    pub cancel: CancellationToken,
}

impl Client {
    /// Create a new client handle
    pub fn new(
        id: ClientId,
        name: String,
        sender: mpsc::UnboundedSender<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            name,
            sender,
            cancel,
        }
    }

    /// Queue a line for this client without waiting
    ///
    /// The queue is unbounded, so a slow reader only builds a backlog.
    /// The only failure is a writer that has already gone away.
    pub fn deliver(&self, line: String) -> Result<(), SendError> {
        self.sender
            .send(line)
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Ask this client's connection task to tear down
    pub fn disconnect(&self) {
        self.cancel.cancel();
    }
}
