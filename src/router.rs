//! Message routing
//!
//! Decides where a line goes (every other client, or one named client)
//! and enqueues it. A recipient whose writer has already gone away is
//! told to tear down; the rest of the fan-out carries on.

use tracing::{debug, warn};

use crate::client::Client;
use crate::message::{ClientLine, ServerNotice};
use crate::registry::Registry;
use crate::types::ClientId;

/// Outcome of one dispatch
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Recipients that accepted the line
    pub delivered: usize,
    /// Recipients that failed and were asked to disconnect
    pub failed: Vec<ClientId>,
}

/// Route one line received from `sender_name`
///
/// Direct messages to an unknown name are dropped without telling the
/// sender.
pub fn dispatch(registry: &Registry, sender_name: &str, line: &str) -> Delivery {
    match ClientLine::parse(line) {
        ClientLine::Direct { recipient, body } => {
            let mut delivery = Delivery::default();
            match registry.find_by_name(recipient) {
                Some(client) => {
                    let notice = ServerNotice::Private {
                        from: sender_name,
                        body,
                    };
                    deliver(client, notice.to_string(), &mut delivery);
                }
                None => {
                    debug!(
                        "Direct message from '{}' to unknown '{}' dropped",
                        sender_name, recipient
                    );
                }
            }
            delivery
        }
        ClientLine::Broadcast(text) => broadcast(registry, sender_name, text),
    }
}

/// Send `line` verbatim to every client not named `sender_name`
pub fn broadcast(registry: &Registry, sender_name: &str, line: &str) -> Delivery {
    let mut delivery = Delivery::default();
    for client in registry.snapshot() {
        if client.name != sender_name {
            deliver(&client, line.to_string(), &mut delivery);
        }
    }
    delivery
}

fn deliver(client: &Client, line: String, delivery: &mut Delivery) {
    match client.deliver(line) {
        Ok(()) => delivery.delivered += 1,
        Err(e) => {
            warn!(
                "Delivery to {} ('{}') failed: {}, disconnecting",
                client.id, client.name, e
            );
            client.disconnect();
            delivery.failed.push(client.id);
        }
    }
}
