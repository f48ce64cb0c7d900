//! Basic type definitions for the chat relay
//!
//! Provides the `SessionId` newtype and the wall-clock timestamp helper
//! used when stamping outgoing messages.

use serde::{Deserialize, Serialize};

/// Unique session identifier (newtype pattern)
///
/// Assigned by the registry at accept time, strictly increasing for the
/// lifetime of the server process and never reused. Serializes as a bare
/// integer on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current local wall-clock time as `[HH:MM:SS]`.
///
/// Informational only; never used for ordering.
pub fn timestamp_now() -> String {
    chrono::Local::now().format("[%H:%M:%S]").to_string()
}
