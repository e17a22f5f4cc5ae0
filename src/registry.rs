//! Name registry
//!
//! The set of taken display names and which session holds each one.
//! Owned by the `ChatServer` actor, which serializes every call, so
//! `try_register` is a single atomic check-and-insert.

use std::collections::BTreeMap;

use crate::types::{ClientId, ClientName};

/// Name → session identity, iterated in byte order of names
#[derive(Debug, Default)]
pub struct NameRegistry {
    names: BTreeMap<ClientName, ClientId>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for `id`
    ///
    /// Returns false without changing anything if the name is taken.
    pub fn try_register(&mut self, name: &ClientName, id: ClientId) -> bool {
        if self.names.contains_key(name) {
            return false;
        }
        self.names.insert(name.clone(), id);
        true
    }

    /// Free `name`, returning the session that held it
    ///
    /// No-op if the name is not registered.
    pub fn release(&mut self, name: &str) -> Option<ClientId> {
        self.names.remove(name)
    }

    /// Session currently holding `name`
    pub fn owner(&self, name: &str) -> Option<ClientId> {
        self.names.get(name).copied()
    }

    /// Check that `name` is held by `id` specifically
    pub fn is_held_by(&self, name: &str, id: ClientId) -> bool {
        self.owner(name) == Some(id)
    }

    /// Registered names in byte order
    pub fn names(&self) -> impl Iterator<Item = &ClientName> {
        self.names.keys()
    }
}
