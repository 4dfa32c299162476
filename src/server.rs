//! ChatServer Actor implementation
//!
//! The single owner of the registry. Connection tasks never touch it
//! directly; they send commands over an mpsc channel and the actor
//! applies them one at a time, so add, remove and fan-out never
//! interleave.

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::Client;
use crate::error::AppError;
use crate::message::ServerNotice;
use crate::registry::Registry;
use crate::router;
use crate::types::{ClientId, DuplicateNamePolicy};

/// Commands sent from connection tasks to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// Connection read its name line and wants to join
    Register {
        client_id: ClientId,
        name: String,
        sender: mpsc::UnboundedSender<String>,
        cancel: CancellationToken,
        reply: oneshot::Sender<Result<(), AppError>>,
    },
    /// Connection is tearing down; replies whether it was still registered
    Unregister {
        client_id: ClientId,
        reply: oneshot::Sender<bool>,
    },
    /// Connection received a line to route
    Dispatch {
        client_id: ClientId,
        sender_name: String,
        line: String,
    },
    /// Report registered names in registration order
    Roster {
        reply: oneshot::Sender<Vec<String>>,
    },
}

/// The main ChatServer actor
///
/// Processes commands from connection tasks until every sender is dropped.
pub struct ChatServer {
    /// All registered clients
    registry: Registry,
    /// Registration rule for names already in use
    policy: DuplicateNamePolicy,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the default duplicate-name policy
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self::with_policy(receiver, DuplicateNamePolicy::default())
    }

    /// Create a new ChatServer with an explicit duplicate-name policy
    pub fn with_policy(
        receiver: mpsc::Receiver<ServerCommand>,
        policy: DuplicateNamePolicy,
    ) -> Self {
        Self {
            registry: Registry::new(),
            policy,
            receiver,
        }
    }

    /// Run the ChatServer event loop
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Register {
                client_id,
                name,
                sender,
                cancel,
                reply,
            } => {
                let result = self.handle_register(Client::new(client_id, name, sender, cancel));
                let _ = reply.send(result);
            }
            ServerCommand::Unregister { client_id, reply } => {
                let removed = self.handle_unregister(client_id);
                let _ = reply.send(removed);
            }
            ServerCommand::Dispatch {
                client_id,
                sender_name,
                line,
            } => {
                self.handle_dispatch(client_id, &sender_name, &line);
            }
            ServerCommand::Roster { reply } => {
                let _ = reply.send(self.registry.names());
            }
        }
    }

    /// Handle registration, announcing the newcomer to everyone else
    fn handle_register(&mut self, client: Client) -> Result<(), AppError> {
        if self.policy == DuplicateNamePolicy::Reject && self.registry.contains_name(&client.name) {
            info!("Client {} rejected: name '{}' in use", client.id, client.name);
            // Best effort; the queue closes once `client` drops here.
            let _ = client.deliver(ServerNotice::NameTaken { name: &client.name }.to_string());
            return Err(AppError::NameTaken(client.name));
        }

        info!("{} joined the chat ({})", client.name, client.id);
        let joined = ServerNotice::Joined { name: &client.name }.to_string();
        let name = client.name.clone();
        self.registry.add(client);
        router::broadcast(&self.registry, &name, &joined);

        debug!("Total clients: {}", self.registry.len());
        Ok(())
    }

    /// Handle teardown; a second call for the same client is a no-op
    fn handle_unregister(&mut self, client_id: ClientId) -> bool {
        let Some(client) = self.registry.remove(client_id) else {
            debug!("Client {} already unregistered", client_id);
            return false;
        };

        info!("{} left the chat ({})", client.name, client.id);
        let left = ServerNotice::Left { name: &client.name }.to_string();
        router::broadcast(&self.registry, &client.name, &left);

        debug!("Total clients: {}", self.registry.len());
        true
    }

    /// Handle a line from a registered client
    fn handle_dispatch(&mut self, client_id: ClientId, sender_name: &str, line: &str) {
        let delivery = router::dispatch(&self.registry, sender_name, line);
        debug!(
            "Line from {} delivered to {}, {} failed",
            client_id,
            delivery.delivered,
            delivery.failed.len()
        );
    }
}
