//! Forced-logout signalling.
//!
//! The gate is the only integration point the routing/UI layer sees:
//! when authentication becomes irrecoverable, `terminate` clears the
//! session store and broadcasts an event telling the host to navigate to
//! its unauthenticated entry point.

use tokio::sync::broadcast;
use tracing::{info, warn};

use super::session::SessionStore;

/// Capacity of the auth event channel. Termination is rare; a small
/// buffer covers hosts that subscribe late in the same tick.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Signals emitted to the hosting application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// The session is gone. Navigate to the login entry point.
    SessionTerminated,
}

/// Reacts to irrecoverable authentication failure.
#[derive(Clone)]
pub struct SessionGate {
    store: SessionStore,
    events: broadcast::Sender<AuthEvent>,
}

impl SessionGate {
    pub fn new(store: SessionStore) -> (Self, broadcast::Receiver<AuthEvent>) {
        let (events, receiver) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        (Self { store, events }, receiver)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Clear the session and signal the host. Idempotent: terminating an
    /// already-clear session is a no-op beyond the navigation signal.
    pub fn terminate(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session during termination");
        }
        // A host without a live subscriber just misses the signal.
        let _ = self.events.send(AuthEvent::SessionTerminated);
        info!("Session terminated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_terminate_clears_session_and_signals() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().to_path_buf());
        store.set_auth(None, "acc-1", "ref-1").unwrap();

        let (gate, mut events) = SessionGate::new(store.clone());
        gate.terminate();

        assert!(!store.is_authenticated());
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SessionTerminated);
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().to_path_buf());
        let (gate, mut events) = SessionGate::new(store.clone());

        gate.terminate();
        gate.terminate();

        // Each call re-emits the signal even with nothing to clear.
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SessionTerminated);
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SessionTerminated);
        assert!(!store.is_authenticated());
    }
}
