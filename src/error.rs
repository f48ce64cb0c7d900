//! Error types for the chat relay
//!
//! Defines the relay error taxonomy and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::SessionId;

/// Relay errors
///
/// Every variant is local to a single session: a failure drives that
/// session to its closed state and never propagates to other sessions.
/// The only fatal error in the process is failing to bind the listener,
/// which surfaces as `Io` from `main` before any session exists.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Channel read/write failure (connection error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Undecodable or unencodable record (protocol error)
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame payload larger than the protocol allows
    #[error("frame exceeds maximum size: len={len} max={max}")]
    FrameTooLarge { len: usize, max: usize },

    /// Peer closed the connection in the middle of a frame
    #[error("connection closed mid-frame")]
    UnexpectedEof,

    /// Peer vanished before completing the handshake
    #[error("connection closed during handshake")]
    HandshakeEof,

    /// Display name already in use by a connected session
    #[error("display name '{0}' is already taken")]
    NameTaken(String),

    /// Session was removed before the operation reached it
    #[error("session {0} is no longer registered")]
    UnknownSession(SessionId),
}

/// Message send errors
///
/// Occurs when attempting to deliver through a closed outbound channel.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
