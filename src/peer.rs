//! Client-side line composition
//!
//! Broadcast lines carry the sender's name, added by the client itself;
//! direct messages go out untouched and the server adds the prefix.

use crate::message::DIRECT_SIGIL;

/// Turn a line typed by `name` into the line sent on the wire
pub fn compose_line(name: &str, input: &str) -> String {
    if input.starts_with(DIRECT_SIGIL) {
        input.to_string()
    } else {
        format!("{}: {}", name, input)
    }
}
