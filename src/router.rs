//! Router / broadcast hub
//!
//! Holds the outbound handle of every Active session, decides who an
//! inbound line is for, and fans it out. The table mirrors the name
//! registry; the `ChatServer` actor updates both together.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::client::Client;
use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ClientName;

/// Delivery decision for one inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Everyone, sender included
    Broadcast { text: String },
    /// Sender and `recipient` only; `text` has the marker removed
    Unicast { recipient: ClientName, text: String },
}

/// Decide where `line` goes
///
/// The first name (in the order given) whose `<name>>>` marker appears
/// anywhere in the line is the recipient. This is containment, not a
/// prefix match: `Bob>>` inside free text still makes the line directed.
pub fn classify<'a, I>(names: I, line: String) -> Route
where
    I: IntoIterator<Item = &'a ClientName>,
{
    for name in names {
        let marker = name.unicast_marker();
        if line.contains(&marker) {
            return Route::Unicast {
                recipient: name.clone(),
                text: line.replacen(&marker, "", 1),
            };
        }
    }
    Route::Broadcast { text: line }
}

/// Active sessions keyed by name, remembered in join order
#[derive(Debug, Default)]
pub struct Router {
    clients: HashMap<ClientName, Client>,
    order: Vec<ClientName>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an Active session; replaces nothing because names are unique
    pub fn insert(&mut self, client: Client) {
        let name = client.name.clone();
        if self.clients.insert(name.clone(), client).is_none() {
            self.order.push(name);
        }
    }

    /// Drop a session's outbound handle
    pub fn remove(&mut self, name: &str) -> Option<Client> {
        let client = self.clients.remove(name)?;
        self.order.retain(|n| n.as_str() != name);
        Some(client)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Active names in join order
    pub fn roster(&self) -> Vec<ClientName> {
        self.order.clone()
    }

    /// Send the current roster to every Active session
    ///
    /// Returns the sessions that could not take it.
    pub fn broadcast_roster(&self) -> Vec<ClientName> {
        self.broadcast(ServerMessage::ClientList(self.roster()))
    }

    /// Send `msg` to every Active session, in join order
    ///
    /// A failed handle never stops the loop. Returns the sessions whose
    /// queue was closed or full; none of them got `msg`.
    pub fn broadcast(&self, msg: ServerMessage) -> Vec<ClientName> {
        let mut closed = Vec::new();
        for name in &self.order {
            if let Some(client) = self.clients.get(name) {
                Self::push(client, msg.clone(), &mut closed);
            }
        }
        closed
    }

    /// Fan out a routed chat line from `sender`
    ///
    /// Unicast goes to the sender and the recipient (once, if they are the
    /// same session). Whichever of the two is missing is skipped.
    pub fn deliver(&self, sender: &ClientName, route: Route) -> Vec<ClientName> {
        match route {
            Route::Broadcast { text } => {
                debug!("MESSAGE {}: {} (broadcast)", sender, text);
                self.broadcast(ServerMessage::Message {
                    from: sender.clone(),
                    text,
                })
            }
            Route::Unicast { recipient, text } => {
                debug!("MESSAGE {}: {} (to {})", sender, text, recipient);
                let msg = ServerMessage::Message {
                    from: sender.clone(),
                    text,
                };
                let mut targets = vec![sender];
                if &recipient != sender {
                    targets.push(&recipient);
                }

                let mut closed = Vec::new();
                for name in targets {
                    match self.clients.get(name.as_str()) {
                        Some(client) => Self::push(client, msg.clone(), &mut closed),
                        None => debug!("Unicast target {} already gone", name),
                    }
                }
                closed
            }
        }
    }

    fn push(client: &Client, msg: ServerMessage, closed: &mut Vec<ClientName>) {
        match client.send(msg) {
            Ok(()) => {}
            Err(SendError::ChannelFull) => {
                warn!("Outbound queue full for {}, dropping session", client.name);
                closed.push(client.name.clone());
            }
            Err(SendError::ChannelClosed) => {
                debug!("Outbound handle for {} is closed", client.name);
                closed.push(client.name.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::types::ClientId;

    fn name(s: &str) -> ClientName {
        ClientName::parse(s).unwrap()
    }

    fn join(router: &mut Router, n: &str) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(16);
        router.insert(Client::new(ClientId::new(), name(n), tx));
        rx
    }

    fn chat(from: &str, text: &str) -> ServerMessage {
        ServerMessage::Message {
            from: name(from),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_classify_broadcast() {
        let names = [name("Alice"), name("Bob")];
        assert_eq!(
            classify(&names, "hello all".to_string()),
            Route::Broadcast {
                text: "hello all".to_string()
            }
        );
    }

    #[test]
    fn test_classify_unicast_strips_marker() {
        let names = [name("Alice"), name("Bob")];
        assert_eq!(
            classify(&names, "Bob>>hello".to_string()),
            Route::Unicast {
                recipient: name("Bob"),
                text: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_classify_marker_anywhere_in_line() {
        let names = [name("Bob")];
        assert_eq!(
            classify(&names, "ask Bob>>later".to_string()),
            Route::Unicast {
                recipient: name("Bob"),
                text: "ask later".to_string()
            }
        );
    }

    #[test]
    fn test_classify_strips_first_marker_only() {
        let names = [name("Bob")];
        assert_eq!(
            classify(&names, "Bob>>see Bob>>".to_string()),
            Route::Unicast {
                recipient: name("Bob"),
                text: "see Bob>>".to_string()
            }
        );
    }

    #[test]
    fn test_classify_containment_picks_first_name() {
        // Byte order: "Bob" before "Bobby"
        let names = [name("Bob"), name("Bobby")];
        assert_eq!(
            classify(&names, "Bob>>hi".to_string()),
            Route::Unicast {
                recipient: name("Bob"),
                text: "hi".to_string()
            }
        );
    }

    #[test]
    fn test_classify_unknown_marker_is_broadcast() {
        let names = [name("Alice")];
        assert!(matches!(
            classify(&names, "Zed>>hi".to_string()),
            Route::Broadcast { .. }
        ));
    }

    #[test]
    fn test_roster_join_order() {
        let mut router = Router::new();
        let _c = join(&mut router, "Carol");
        let _a = join(&mut router, "Alice");
        let _b = join(&mut router, "Bob");

        assert_eq!(router.roster(), vec![name("Carol"), name("Alice"), name("Bob")]);

        router.remove("Alice");
        assert_eq!(router.roster(), vec![name("Carol"), name("Bob")]);
        assert!(router.remove("Alice").is_none());
    }

    #[test]
    fn test_broadcast_reaches_everyone_once() {
        let mut router = Router::new();
        let mut a = join(&mut router, "A");
        let mut b = join(&mut router, "B");
        let mut c = join(&mut router, "C");

        let closed = router.deliver(
            &name("A"),
            Route::Broadcast {
                text: "hey".to_string(),
            },
        );
        assert!(closed.is_empty());

        for rx in [&mut a, &mut b, &mut c] {
            assert_eq!(rx.try_recv().ok(), Some(chat("A", "hey")));
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn test_unicast_reaches_sender_and_recipient_only() {
        let mut router = Router::new();
        let mut a = join(&mut router, "A");
        let mut b = join(&mut router, "B");
        let mut c = join(&mut router, "C");

        router.deliver(
            &name("A"),
            Route::Unicast {
                recipient: name("B"),
                text: "hello".to_string(),
            },
        );

        assert_eq!(a.try_recv().ok(), Some(chat("A", "hello")));
        assert_eq!(b.try_recv().ok(), Some(chat("A", "hello")));
        assert!(c.try_recv().is_err());
    }

    #[test]
    fn test_unicast_to_self_delivered_once() {
        let mut router = Router::new();
        let mut a = join(&mut router, "A");

        router.deliver(
            &name("A"),
            Route::Unicast {
                recipient: name("A"),
                text: "note".to_string(),
            },
        );

        assert_eq!(a.try_recv().ok(), Some(chat("A", "note")));
        assert!(a.try_recv().is_err());
    }

    #[test]
    fn test_closed_handle_does_not_stop_fan_out() {
        let mut router = Router::new();
        let a = join(&mut router, "A");
        let mut b = join(&mut router, "B");
        drop(a);

        let closed = router.broadcast(chat("B", "still here"));

        assert_eq!(closed, vec![name("A")]);
        assert_eq!(b.try_recv().ok(), Some(chat("B", "still here")));
    }

    #[test]
    fn test_full_handle_reported_for_teardown() {
        let mut router = Router::new();
        let (tx, mut slow) = mpsc::channel(1);
        router.insert(Client::new(ClientId::new(), name("Slow"), tx));
        let mut b = join(&mut router, "B");

        assert!(router.broadcast(chat("B", "one")).is_empty());
        let closed = router.broadcast(chat("B", "two"));

        assert_eq!(closed, vec![name("Slow")]);
        assert_eq!(slow.try_recv().ok(), Some(chat("B", "one")));
        assert_eq!(b.try_recv().ok(), Some(chat("B", "one")));
        assert_eq!(b.try_recv().ok(), Some(chat("B", "two")));
    }

    #[test]
    fn test_unicast_missing_recipient_is_best_effort() {
        let mut router = Router::new();
        let mut a = join(&mut router, "A");

        let closed = router.deliver(
            &name("A"),
            Route::Unicast {
                recipient: name("Gone"),
                text: "anyone?".to_string(),
            },
        );

        assert!(closed.is_empty());
        assert_eq!(a.try_recv().ok(), Some(chat("A", "anyone?")));
    }
}
