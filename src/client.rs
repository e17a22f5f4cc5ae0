//! Client struct definition
//!
//! The coordinator's handle on an Active session: who it is and where its
//! outbound lines go.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::{ClientId, ClientName};

/// Registered client information
#[derive(Debug)]
pub struct Client {
    /// Session identity
    pub id: ClientId,
    /// Registered display name
    pub name: ClientName,
    /// Server → Client message channel, drained by the session's writer task
    pub sender: mpsc::Sender<ServerMessage>,
}

impl Client {
    /// Create a new client with the given identity and sender channel
    pub fn new(id: ClientId, name: ClientName, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, name, sender }
    }

    /// Queue a message for this client without waiting
    ///
    /// Either error means `msg` was not queued and the session should be
    /// torn down: `ChannelClosed` when the writer task is gone,
    /// `ChannelFull` when the client has stopped draining its queue.
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Closed(_) => SendError::ChannelClosed,
            TrySendError::Full(_) => SendError::ChannelFull,
        })
    }
}
