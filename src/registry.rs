use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::session::ClientSession;

/// Lifecycle notifications published by the registry.
///
/// Subscribers that fall behind receive `Lagged` from the broadcast channel;
/// the registry never waits on them.
#[derive(Debug, Clone)]
pub enum HubEvent {
    Registered { id: String, connection_id: Uuid },
    Frame { id: String, connection_id: Uuid, payload: Bytes },
    Unregistered { id: String, connection_id: Uuid },
}

/// Process-wide map from stack identifier to the session believed connected.
///
/// All operations take the same mutex and never hold it across an await or
/// any socket I/O. Duplicate registrations replace the prior entry without
/// closing its connection; the superseded session keeps running until its
/// own transport fails.
#[derive(Clone)]
pub struct ConnectionRegistry {
    sessions: Arc<Mutex<HashMap<String, ClientSession>>>,
    events_tx: broadcast::Sender<HubEvent>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    const EVENT_CAPACITY: usize = 256;

    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(Self::EVENT_CAPACITY);
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            events_tx,
        }
    }

    /// Insert `session` under its stack id, replacing any existing entry.
    pub fn register(&self, session: ClientSession) {
        let id = session.id().to_owned();
        let connection_id = session.connection_id();

        // Events go out under the lock so their order matches the map's.
        let replaced = {
            let mut sessions = self.sessions.lock();
            let replaced = sessions.insert(id.clone(), session);
            let _ = self.events_tx.send(HubEvent::Registered {
                id: id.clone(),
                connection_id,
            });
            replaced
        };

        if let Some(previous) = replaced {
            tracing::warn!(
                stack_id = %id,
                previous_connection = %previous.connection_id(),
                %connection_id,
                "stack id re-registered; previous connection left open"
            );
        }
    }

    /// Remove the entry for `id`. Absent ids are a no-op.
    pub fn unregister(&self, id: &str) {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.remove(id) {
            let _ = self.events_tx.send(HubEvent::Unregistered {
                id: id.to_owned(),
                connection_id: session.connection_id(),
            });
        }
    }

    pub fn lookup(&self, id: &str) -> Option<ClientSession> {
        self.sessions.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<HubEvent> {
        self.events_tx.subscribe()
    }

    pub(crate) fn publish(&self, event: HubEvent) {
        let _ = self.events_tx.send(event);
    }
}
