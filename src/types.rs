//! Basic type definitions for the chat relay
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: UUID-based connection identity
//! - `DuplicateNamePolicy`: what registration does with a name already in use

use serde::Deserialize;
use uuid::Uuid;

/// Unique connection identifier (newtype pattern)
///
/// Display names are not unique under every policy, so the registry
/// removes connections by this identity rather than by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registration behaviour for a display name that is already registered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateNamePolicy {
    /// Refuse the second connection with a notice line, then close it
    #[default]
    Reject,
    /// Register both; direct messages reach the earliest registration
    Allow,
}
