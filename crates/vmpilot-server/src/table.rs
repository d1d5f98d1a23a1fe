//! Session table: process-wide registry of live sessions.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use vmpilot_common::SessionId;

/// What the table knows about one session.
pub struct SessionEntry {
    pub peer: SocketAddr,
    pub cancel: CancellationToken,
    pub created_at: Instant,
    pub instance_id: Option<String>,
}

impl SessionEntry {
    pub fn new(peer: SocketAddr, cancel: CancellationToken) -> Self {
        Self {
            peer,
            cancel,
            created_at: Instant::now(),
            instance_id: None,
        }
    }
}

/// Thread-safe session table.
#[derive(Clone, Default)]
pub struct SessionTable {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session. Returns false if the id is already present.
    pub async fn insert(&self, id: SessionId, entry: SessionEntry) -> bool {
        let mut map = self.sessions.write().await;
        if map.contains_key(&id) {
            return false;
        }
        map.insert(id, entry);
        true
    }

    /// Record the instance bound to a session.
    pub async fn set_instance(&self, id: &SessionId, instance_id: &str) {
        if let Some(entry) = self.sessions.write().await.get_mut(id) {
            entry.instance_id = Some(instance_id.to_string());
        }
    }

    /// Remove a session. Returns true if it was present.
    pub async fn remove(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Number of sessions with a bound instance.
    pub async fn instance_count(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|e| e.instance_id.is_some())
            .count()
    }

    /// Age of the oldest session.
    pub async fn oldest_age(&self) -> Option<Duration> {
        self.sessions
            .read()
            .await
            .values()
            .map(|e| e.created_at.elapsed())
            .max()
    }

    /// Cancel every session. Entries are removed by the sessions themselves.
    pub async fn cancel_all(&self) -> usize {
        let map = self.sessions.read().await;
        for (id, entry) in map.iter() {
            tracing::info!(session = %id, peer = %entry.peer, "Cancelling session");
            entry.cancel.cancel();
        }
        map.len()
    }

    /// Wait until every session has removed itself, or the timeout expires.
    /// Returns the number still registered.
    pub async fn drain(&self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = self.count().await;
            if remaining == 0 || Instant::now() >= deadline {
                return remaining;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}
