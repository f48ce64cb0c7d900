//! TCP Chat Relay Server Library
//!
//! A chat relay built on tokio: many concurrent TCP connections, each
//! assigned a monotonically increasing identity, with messages routed
//! among them — broadcast to everyone else, whispers addressed by
//! display name, and server-originated announcements and moderation.
//!
//! # Features
//! - Length-prefixed JSON wire protocol (handshake + envelopes)
//! - Broadcast with sender exclusion
//! - Whispers resolved by display name
//! - `/list` of connected users, answered only to the requester
//! - Join/leave/kick notifications, delivered exactly once
//! - Operator console: `/kick <name>` and server broadcasts
//! - Optional startup banner embedded in every greeting
//!
//! # Architecture
//! The registry (id → session) is the only shared mutable state,
//! behind a single exclusive lock. Fan-out targets are snapshotted
//! under the lock and written after it is released, so a slow
//! recipient never stalls registry mutation. Each connection gets a
//! reader task (handshake + routing) and a writer task draining that
//! session's outbound queue.
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_relay::{console, Relay};
//!
//! #[tokio::main]
//! async fn main() {
//!     let relay = Relay::new("welcome!");
//!     let listener = TcpListener::bind("127.0.0.1:7676").await.unwrap();
//!     tokio::spawn(console::run(relay.clone()));
//!     relay.run(listener).await;
//! }
//! ```

pub mod codec;
pub mod config;
pub mod console;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod routing;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use error::{RelayError, SendError};
pub use handler::handle_connection;
pub use message::{Action, DisplayHint, Envelope, Handshake};
pub use registry::{Registry, SharedRegistry};
pub use routing::Router;
pub use server::Relay;
pub use session::{Outbound, Session};
pub use types::SessionId;
