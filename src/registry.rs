//! Connection registry
//!
//! The authoritative id → session mapping. One exclusive lock guards
//! every read or write that iterates or mutates it; the lock is never
//! held across an await point, so all socket and channel writes happen
//! against snapshots taken here.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::error::RelayError;
use crate::session::{Outbound, Session};
use crate::types::SessionId;

/// The registry behind its single exclusive lock.
pub type SharedRegistry = Arc<Mutex<Registry>>;

/// Id → session mapping plus the id allocator
///
/// Ids are strictly increasing in acceptance order and never reused,
/// even after the owning session ends. Keying on the id keeps iteration
/// in insertion order, which the exclusion logic and `/list` use
/// internally; peers must not rely on it.
#[derive(Debug, Default)]
pub struct Registry {
    next_id: u64,
    sessions: BTreeMap<SessionId, Session>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the shared, lock-guarded form.
    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Register a freshly accepted connection and assign its id.
    ///
    /// Never fails. The session starts unnamed; `set_name` completes it
    /// once the handshake return leg arrives.
    pub fn insert(&mut self, outbound: mpsc::Sender<Outbound>) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        self.sessions.insert(id, Session::new(id, outbound));
        id
    }

    /// Remove a session, returning it if it was still present.
    ///
    /// Idempotent: removing twice is a no-op. The caller that actually
    /// got the session back is the one responsible for the leave
    /// notification, which keeps it exactly-once.
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    /// Look up a session by id.
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Resolve a display name to a session; explicit first match.
    ///
    /// Names are unique while connected (`set_name` rejects
    /// duplicates), so the scan resolves uniquely in practice.
    pub fn find_by_name(&self, name: &str) -> Option<&Session> {
        self.sessions
            .values()
            .find(|s| s.name.as_deref() == Some(name))
    }

    /// Complete a session's handshake by setting its display name.
    ///
    /// Rejects names already held by a connected session, and reports
    /// a session that was removed while its handshake was in flight.
    pub fn set_name(&mut self, id: SessionId, name: &str) -> Result<(), RelayError> {
        if self.find_by_name(name).is_some() {
            return Err(RelayError::NameTaken(name.to_string()));
        }
        match self.sessions.get_mut(&id) {
            Some(session) => {
                session.name = Some(name.to_string());
                Ok(())
            }
            None => Err(RelayError::UnknownSession(id)),
        }
    }

    /// Consistent point-in-time copy of all sessions, in id order.
    pub fn snapshot(&self) -> Vec<Session> {
        self.sessions.values().cloned().collect()
    }

    /// Number of sessions that have completed their handshake.
    ///
    /// Derived under the lock rather than kept as a separate counter.
    pub fn named_count(&self) -> usize {
        self.sessions.values().filter(|s| s.is_named()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> mpsc::Sender<Outbound> {
        mpsc::channel(8).0
    }

    #[test]
    fn test_ids_strictly_increasing_and_never_reused() {
        let mut registry = Registry::new();
        let a = registry.insert(sender());
        let b = registry.insert(sender());
        assert!(b > a);

        registry.remove(a);
        let c = registry.insert(sender());
        assert!(c > b, "freed ids must not be reused");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = Registry::new();
        let id = registry.insert(sender());

        assert!(registry.remove(id).is_some());
        assert!(registry.remove(id).is_none());
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn test_find_by_name() {
        let mut registry = Registry::new();
        let a = registry.insert(sender());
        let b = registry.insert(sender());
        registry.set_name(a, "alice").unwrap();
        registry.set_name(b, "bob").unwrap();

        assert_eq!(registry.find_by_name("bob").unwrap().id, b);
        assert!(registry.find_by_name("carol").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = Registry::new();
        let a = registry.insert(sender());
        let b = registry.insert(sender());
        registry.set_name(a, "alice").unwrap();

        assert!(matches!(
            registry.set_name(b, "alice"),
            Err(RelayError::NameTaken(_))
        ));
        assert!(!registry.get(b).unwrap().is_named());

        // Name becomes available again once the holder leaves.
        registry.remove(a);
        registry.set_name(b, "alice").unwrap();
    }

    #[test]
    fn test_set_name_on_removed_session_errors() {
        let mut registry = Registry::new();
        let id = registry.insert(sender());
        registry.remove(id);

        assert!(matches!(
            registry.set_name(id, "ghost"),
            Err(RelayError::UnknownSession(_))
        ));
        assert!(registry.find_by_name("ghost").is_none());
    }

    #[test]
    fn test_snapshot_in_insertion_order() {
        let mut registry = Registry::new();
        let ids: Vec<_> = (0..5).map(|_| registry.insert(sender())).collect();
        registry.remove(ids[2]);

        let snapshot = registry.snapshot();
        let seen: Vec<_> = snapshot.iter().map(|s| s.id).collect();
        assert_eq!(seen, vec![ids[0], ids[1], ids[3], ids[4]]);
    }

    #[test]
    fn test_named_count_ignores_handshaking_sessions() {
        let mut registry = Registry::new();
        let a = registry.insert(sender());
        let _pending = registry.insert(sender());
        registry.set_name(a, "alice").unwrap();

        assert_eq!(registry.named_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_yield_unique_ids() {
        let registry = Registry::shared();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let (tx, _rx) = mpsc::channel(8);
                registry.lock().unwrap().insert(tx)
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 32);
    }
}
