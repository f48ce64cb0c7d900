//! Routing engine
//!
//! Decides, for each inbound envelope, who receives it: broadcast to
//! every other named session, whisper to one session resolved by
//! display name, or a `/list` reply to the requester alone. Also
//! carries the server-originated paths: announcements and kick.
//!
//! Membership for every fan-out comes from a single lock-consistent
//! registry snapshot; the actual channel writes happen after the lock
//! is released.

use tracing::{debug, info};

use crate::message::Envelope;
use crate::registry::SharedRegistry;
use crate::session::Session;
use crate::types::SessionId;

/// The routing engine
///
/// Holds no session state of its own; every decision re-resolves
/// through the registry, so a concurrently removed session is simply
/// absent from the next lookup.
#[derive(Debug, Clone)]
pub struct Router {
    registry: SharedRegistry,
}

impl Router {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    /// Dispatch one inbound envelope from an active session.
    ///
    /// The session handler has already stamped `sender_id` and
    /// `sender_name` from its own registry entry.
    pub async fn route(&self, envelope: Envelope) {
        if envelope.is_list_request() {
            if let Some(requester) = envelope.sender_id {
                self.send_list(requester).await;
            }
            return;
        }

        if envelope.to_name.is_some() {
            self.whisper(envelope).await;
        } else {
            let exclude = envelope.sender_id;
            self.broadcast(envelope, exclude).await;
        }
    }

    /// Deliver to every named session except `exclude`.
    pub async fn broadcast(&self, envelope: Envelope, exclude: Option<SessionId>) {
        let targets: Vec<Session> = {
            let registry = self.registry.lock().unwrap();
            registry
                .snapshot()
                .into_iter()
                .filter(|s| s.is_named() && Some(s.id) != exclude)
                .collect()
        };

        for target in targets {
            let _ = target.deliver(envelope.clone());
        }
    }

    /// Deliver to the one session whose name matches `to_name`.
    ///
    /// An absent target drops the envelope silently; the sender gets no
    /// delivery-failure notice.
    pub async fn whisper(&self, envelope: Envelope) {
        let to_name = envelope.to_name.as_deref().unwrap_or_default();
        let target = {
            let registry = self.registry.lock().unwrap();
            registry.find_by_name(to_name).cloned()
        };

        match target {
            Some(target) => {
                let _ = target.deliver(envelope);
            }
            None => debug!("whisper target '{}' not found, dropping", to_name),
        }
    }

    /// Reply to a `/list` request; only the requester hears back.
    pub async fn send_list(&self, requester: SessionId) {
        let (requester, names) = {
            let registry = self.registry.lock().unwrap();
            let names: Vec<String> = registry
                .snapshot()
                .into_iter()
                .filter_map(|s| s.name)
                .collect();
            (registry.get(requester).cloned(), names)
        };

        if let Some(requester) = requester {
            let _ = requester.deliver(Envelope::user_list(&names));
        }
    }

    /// Operator-issued broadcast; every named session hears it.
    pub async fn server_broadcast(&self, text: &str) {
        self.broadcast(Envelope::server_notice(text), None).await;
    }

    /// Remove a session by display name at the operator's request.
    ///
    /// The victim is removed from the registry first, then told it was
    /// kicked and asked to shut down; the remaining sessions get one
    /// kicked notice. The victim's own close path finds the registry
    /// entry already gone and stays silent, so exactly one removal and
    /// one notice occur. Returns false when no session has that name.
    pub async fn kick(&self, name: &str) -> bool {
        let victim = {
            let mut registry = self.registry.lock().unwrap();
            let id = registry.find_by_name(name).map(|s| s.id);
            id.and_then(|id| registry.remove(id))
        };

        let Some(victim) = victim else {
            return false;
        };

        info!("kicked {} (session {})", name, victim.id);
        let _ = victim.deliver(Envelope::kicked(name));
        let _ = victim.shutdown().await;

        self.broadcast(Envelope::kicked_notice(name), Some(victim.id))
            .await;
        true
    }
}
