//! Session struct definition
//!
//! Server-side state for one connected client: its id, display name,
//! and the outbound channel drained by that connection's writer task.

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::SendError;
use crate::message::Envelope;
use crate::types::SessionId;

/// Instruction for a session's writer task.
#[derive(Debug)]
pub enum Outbound {
    /// Write this envelope to the socket
    Deliver(Envelope),
    /// Stop writing and shut the socket down
    Shutdown,
}

/// One connected client
///
/// The socket itself is owned by the connection's reader and writer
/// tasks; everything else reaches the client only through `outbound`.
/// Cloning a session clones the channel handle, not the connection.
#[derive(Debug, Clone)]
pub struct Session {
    /// Registry-assigned identity, stable for the session's lifetime
    pub id: SessionId,
    /// Display name (None until the handshake completes)
    pub name: Option<String>,
    /// Queue drained by the connection's writer task
    outbound: mpsc::Sender<Outbound>,
}

impl Session {
    /// Create a session for a freshly accepted connection.
    pub fn new(id: SessionId, outbound: mpsc::Sender<Outbound>) -> Self {
        Self {
            id,
            name: None,
            outbound,
        }
    }

    /// Queue an envelope for delivery to this client.
    ///
    /// Delivery is best-effort, at-most-once: a full queue (stalled
    /// client) drops the envelope rather than blocking the caller, so
    /// one slow recipient never wedges a broadcaster. Returns an error
    /// only if the connection's writer task is gone.
    pub fn deliver(&self, envelope: Envelope) -> Result<(), SendError> {
        match self.outbound.try_send(Outbound::Deliver(envelope)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("outbound queue full for session {}, dropping message", self.id);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SendError::ChannelClosed),
        }
    }

    /// Ask this session's writer task to close the connection.
    pub async fn shutdown(&self) -> Result<(), SendError> {
        self.outbound
            .send(Outbound::Shutdown)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Whether the handshake has completed.
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    /// Display name, or a placeholder while still handshaking.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<handshaking>")
    }
}
