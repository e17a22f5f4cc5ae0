//! Line protocol definitions
//!
//! One message per newline-terminated UTF-8 line. The server side is a
//! closed set of messages rendered through `Display`; the client side is
//! free text, so inbound data is just a line or the end of the stream.

use std::fmt;

use crate::types::ClientName;

/// Leading pseudo-entry of every roster, meaning "all recipients"
pub const ALL_RECIPIENTS: &str = "All";

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Prompt for a candidate name
    SubmitName,
    /// Registration succeeded
    NameAccepted,
    /// Current roster, in join order
    ClientList(Vec<ClientName>),
    /// Delivered chat line
    Message { from: ClientName, text: String },
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::SubmitName => f.write_str("SUBMITNAME"),
            ServerMessage::NameAccepted => f.write_str("NAMEACCEPTED"),
            ServerMessage::ClientList(names) => {
                f.write_str("CLIENTLIST")?;
                f.write_str(ALL_RECIPIENTS)?;
                for name in names {
                    write!(f, ",{}", name)?;
                }
                Ok(())
            }
            ServerMessage::Message { from, text } => write!(f, "MESSAGE {}: {}", from, text),
        }
    }
}

/// Result of reading from a client
///
/// Keeps "client sent an empty line" apart from "client went away".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Line(String),
    EndOfStream,
}
