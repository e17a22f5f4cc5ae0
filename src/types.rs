//! Basic type definitions for the chat relay
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: UUID-based unique session identifier
//! - `ClientName`: display name chosen by the client

use std::borrow::Borrow;

use uuid::Uuid;

/// Unique session identifier (newtype pattern)
///
/// Wraps a UUID v4. Names can be reused after a client leaves, so the
/// coordinator uses this to tell two sessions with the same name apart.
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

/// Display name of a registered client
///
/// Non-empty and case-sensitive. Ordering is plain byte order, which is
/// the order recipients are matched in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientName(String);

impl ClientName {
    /// Accept a candidate name read from the wire
    ///
    /// Returns None for an empty candidate.
    pub fn parse(candidate: impl Into<String>) -> Option<Self> {
        let candidate = candidate.into();
        if candidate.is_empty() {
            None
        } else {
            Some(Self(candidate))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The marker that directs a line at this client (`<name>>>`)
    pub fn unicast_marker(&self) -> String {
        format!("{}>>", self.0)
    }
}

impl Borrow<str> for ClientName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
