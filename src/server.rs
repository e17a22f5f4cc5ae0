//! ChatServer Actor implementation
//!
//! The coordinator that owns the name registry and the router table.
//! Handlers talk to it over an mpsc channel; because commands are handled
//! one at a time, every registry/router change and every fan-out happens
//! in a single critical section.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::message::ServerMessage;
use crate::registry::NameRegistry;
use crate::router::{classify, Router};
use crate::types::{ClientId, ClientName};

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// Try to claim a name and become Active
    ///
    /// Replies true on success. On success the actor has already queued
    /// `NAMEACCEPTED` and the roster on `sender`.
    Register {
        client_id: ClientId,
        name: ClientName,
        sender: mpsc::Sender<ServerMessage>,
        reply: oneshot::Sender<bool>,
    },
    /// Route one inbound chat line
    Deliver {
        client_id: ClientId,
        name: ClientName,
        line: String,
    },
    /// Active session is closing
    Leave {
        client_id: ClientId,
        name: ClientName,
    },
}

/// The main ChatServer actor
pub struct ChatServer {
    /// Taken names: ClientName -> ClientId
    registry: NameRegistry,
    /// Outbound handles of Active sessions
    router: Router,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            registry: NameRegistry::new(),
            router: Router::new(),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
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
                reply,
            } => {
                let accepted = self.handle_register(client_id, name, sender);
                let _ = reply.send(accepted);
            }
            ServerCommand::Deliver {
                client_id,
                name,
                line,
            } => {
                self.handle_deliver(client_id, name, line);
            }
            ServerCommand::Leave { client_id, name } => {
                self.handle_leave(client_id, name);
            }
        }
    }

    /// Handle a name claim
    fn handle_register(
        &mut self,
        client_id: ClientId,
        name: ClientName,
        sender: mpsc::Sender<ServerMessage>,
    ) -> bool {
        if !self.registry.try_register(&name, client_id) {
            debug!("Client {} lost name '{}' to an existing session", client_id, name);
            return false;
        }

        info!("New client added: {} ({})", name, client_id);
        let client = Client::new(client_id, name, sender);

        // Queued ahead of the roster so the client sees them in this order
        let mut closed = Vec::new();
        if client.send(ServerMessage::NameAccepted).is_err() {
            closed.push(client.name.clone());
        }
        self.router.insert(client);

        closed.extend(self.router.broadcast_roster());
        self.evict(closed);

        debug!("Total clients: {}", self.router.len());
        true
    }

    /// Handle an inbound chat line
    fn handle_deliver(&mut self, client_id: ClientId, name: ClientName, line: String) {
        if !self.registry.is_held_by(name.as_str(), client_id) {
            debug!("Dropping line from stale session {} ({})", name, client_id);
            return;
        }

        let route = classify(self.registry.names(), line);
        let closed = self.router.deliver(&name, route);
        self.evict(closed);
    }

    /// Handle a session closing on its own
    fn handle_leave(&mut self, client_id: ClientId, name: ClientName) {
        if !self.registry.is_held_by(name.as_str(), client_id) {
            // Already torn down, possibly by a failed delivery
            debug!("Client {} ({}) already removed", name, client_id);
            return;
        }

        self.evict(vec![name]);
    }

    /// Tear down sessions and announce the new roster once per removal
    ///
    /// A roster broadcast can itself uncover more closed handles; those are
    /// queued and removed in turn.
    fn evict(&mut self, mut pending: Vec<ClientName>) {
        while let Some(name) = pending.pop() {
            if self.router.remove(name.as_str()).is_none() {
                continue;
            }
            if let Some(client_id) = self.registry.release(name.as_str()) {
                info!("Client removed: {} ({})", name, client_id);
            }

            pending.extend(self.router.broadcast_roster());
            debug!("Total clients: {}", self.router.len());
        }
    }
}
