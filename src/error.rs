//! Error types for the chat relay
//!
//! Defines application-level errors and outbound send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// All of these are fatal for the connection (or for startup, in the case
/// of `InvalidPort`). Name conflicts are not errors; the session re-prompts.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error: oversized line or IO failure underneath the codec
    #[error("Line codec error: {0}")]
    Lines(#[from] tokio_util::codec::LinesCodecError),

    /// Channel send error (fatal - coordinator gone)
    #[error("Channel send error")]
    ChannelSend,

    /// Listen port argument could not be parsed
    #[error("Invalid port: {0}")]
    InvalidPort(String),
}

/// Outbound send errors
///
/// Returned when pushing a line into a session's outbound channel.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The session's writer task has ended
    #[error("Channel closed")]
    ChannelClosed,

    /// The session is not draining its queue fast enough
    #[error("Channel full")]
    ChannelFull,
}
