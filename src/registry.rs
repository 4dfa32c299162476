//! Registry of live connections
//!
//! Owned by the ChatServer actor, so every mutation and every snapshot
//! is already serialized by the actor's command loop.

use crate::client::Client;
use crate::types::ClientId;

/// Registered clients in registration order
///
/// Order matters: with duplicate names allowed, a direct message goes to
/// the earliest registration of that name.
#[derive(Debug, Default)]
pub struct Registry {
    clients: Vec<Client>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a client unconditionally
    ///
    /// Name policy is the caller's concern; see `contains_name`.
    pub fn add(&mut self, client: Client) {
        self.clients.push(client);
    }

    /// Remove a client by identity
    ///
    /// Returns the removed entry, or None if it was already gone.
    pub fn remove(&mut self, id: ClientId) -> Option<Client> {
        let index = self.clients.iter().position(|c| c.id == id)?;
        Some(self.clients.remove(index))
    }

    /// Point-in-time copy of every registered client
    pub fn snapshot(&self) -> Vec<Client> {
        self.clients.clone()
    }

    /// First client registered under `name`
    pub fn find_by_name(&self, name: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.name == name)
    }

    /// Check if any client is registered under `name`
    pub fn contains_name(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<String> {
        self.clients.iter().map(|c| c.name.clone()).collect()
    }

    /// Number of registered clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Check if no client is registered
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
