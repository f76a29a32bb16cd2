//! Host-owned map from browser tab to session

use super::Session;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Shared handle to one session. Holding the lock is what keeps a session
/// to a single in-flight turn.
pub type SessionHandle = Arc<Mutex<Session>>;

struct Entry {
    handle: SessionHandle,
    last_touched: DateTime<Utc>,
}

impl Entry {
    /// A handle cloned out by a request still in progress
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.handle) > 1
    }

    fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.last_touched)
            .to_std()
            .unwrap_or_default()
    }
}

/// Registry of live sessions, keyed by a random id handed to the page
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Entry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session and return its id
    pub async fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let entry = Entry {
            handle: Arc::new(Mutex::new(Session::new())),
            last_touched: Utc::now(),
        };
        self.sessions.write().await.insert(id.clone(), entry);
        tracing::debug!(session_id = %id, "Session created");
        id
    }

    /// Look up a session and mark it as recently used
    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_touched = Utc::now();
        Some(entry.handle.clone())
    }

    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::debug!(session_id = %id, "Session removed");
        }
        removed
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions untouched for at least `ttl`. Returns how many went.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        self.evict_idle_at(Utc::now(), ttl).await
    }

    async fn evict_idle_at(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.in_use() || entry.idle_for(now) < ttl);
        before - sessions.len()
    }

    /// Background sweep that runs `evict_idle` a few times per `ttl`
    pub fn spawn_eviction(self: Arc<Self>, ttl: Duration) -> JoinHandle<()> {
        let period = (ttl / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = self.evict_idle(ttl).await;
                if evicted > 0 {
                    let remaining = self.count().await;
                    tracing::info!(evicted, remaining, "Evicted idle sessions");
                }
            }
        })
    }
}
