//! Line-oriented TCP Chat Relay Library
//!
//! Clients connect over TCP, pick a unique display name, then chat.
//! Every line is either broadcast to all named clients or, when it
//! contains `<name>>>`, delivered only to the sender and that client.
//!
//! # Protocol
//! - `SUBMITNAME` / `NAMEACCEPTED`: name negotiation
//! - `CLIENTLISTAll,<names>`: roster, sent on every join and leave
//! - `MESSAGE <sender>: <text>`: delivered chat line
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` owns the name registry and the router table
//! - Each connection has a `handler` task communicating with the server
//! - No locks needed - every registry change and fan-out is one command
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use chat_relay::{accept_loop, ChatServer, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:9001").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(ChatServer::new(cmd_rx).run());
//!     accept_loop(listener, cmd_tx, Arc::new(Config::default())).await;
//! }
//! ```

pub mod acceptor;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod router;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use acceptor::accept_loop;
pub use client::Client;
pub use config::Config;
pub use error::{AppError, SendError};
pub use handler::{handle_connection, SessionState};
pub use message::{Inbound, ServerMessage};
pub use registry::NameRegistry;
pub use router::{classify, Route, Router};
pub use server::{ChatServer, ServerCommand};
pub use types::{ClientId, ClientName};
