//! Line protocol definitions
//!
//! Plain newline-delimited text in both directions. A client line is
//! either free text (relayed verbatim) or `@<recipient> <body>`; the
//! server adds its own notice lines on join, departure and private
//! delivery.

use std::fmt;

/// Sigil marking a direct message
pub const DIRECT_SIGIL: char = '@';

/// Client → Server line, classified by its leading character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientLine<'a> {
    /// Free text for every other registered client, forwarded as-is
    Broadcast(&'a str),
    /// `@recipient body` for exactly one client
    Direct { recipient: &'a str, body: &'a str },
}

impl<'a> ClientLine<'a> {
    /// Classify a received line
    ///
    /// The recipient runs from the sigil to the first space. Without a
    /// space the whole remainder is the recipient and the body is empty.
    /// The body is trimmed on both ends.
    pub fn parse(line: &'a str) -> Self {
        let Some(rest) = line.strip_prefix(DIRECT_SIGIL) else {
            return ClientLine::Broadcast(line);
        };

        match rest.split_once(' ') {
            Some((recipient, body)) => ClientLine::Direct {
                recipient,
                body: body.trim(),
            },
            None => ClientLine::Direct {
                recipient: rest,
                body: "",
            },
        }
    }
}

/// Server → Client line generated by the relay itself
///
/// `Display` renders the exact wire text, without the line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerNotice<'a> {
    /// A client registered
    Joined { name: &'a str },
    /// A client was torn down
    Left { name: &'a str },
    /// Direct message body, prefixed with its sender
    Private { from: &'a str, body: &'a str },
    /// Registration refused because the name is in use
    NameTaken { name: &'a str },
}

impl fmt::Display for ServerNotice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerNotice::Joined { name } => write!(f, "Server: {} подключился к чату.", name),
            ServerNotice::Left { name } => write!(f, "Server: {} покинул чат.", name),
            ServerNotice::Private { from, body } => {
                write!(f, "Личное сообщение от {}: {}", from, body)
            }
            ServerNotice::NameTaken { name } => write!(f, "Server: имя {} уже занято.", name),
        }
    }
}
