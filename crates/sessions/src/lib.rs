//! # Custos Sessions
//!
//! Pending onboarding session cache: opaque key to payload, expiring after
//! a fixed TTL, consumed at most once. An explicit store passed into
//! handlers, with an explicit sweep task; no ambient module-level state.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::debug;

/// One cached onboarding session
#[derive(Debug, Clone)]
struct PendingSession {
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
}

/// In-memory session store with TTL expiry
pub struct SessionStore {
    entries: RwLock<HashMap<String, PendingSession>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Save (or overwrite) a session payload under the given key
    pub fn save(&self, key: impl Into<String>, payload: serde_json::Value) {
        let session = PendingSession {
            payload,
            created_at: Utc::now(),
        };
        self.entries.write().unwrap().insert(key.into(), session);
    }

    /// Read a session without consuming it; expired entries read as absent
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let entries = self.entries.read().unwrap();
        entries
            .get(key)
            .filter(|s| !self.expired(s))
            .map(|s| s.payload.clone())
    }

    /// Consume a session: returns the payload at most once
    pub fn take(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.write().unwrap();
        let session = entries.remove(key)?;
        if self.expired(&session) {
            return None;
        }
        Some(session.payload)
    }

    pub fn remove(&self, key: &str) {
        self.entries.write().unwrap().remove(key);
    }

    /// Evict every expired entry; returns how many were removed
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, s| !self.expired(s));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    fn expired(&self, session: &PendingSession) -> bool {
        Utc::now() - session.created_at >= self.ttl
    }
}

/// Spawn the periodic eviction task for a store
pub fn spawn_sweeper(store: Arc<SessionStore>, period: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = interval(period);

        loop {
            timer.tick().await;
            let removed = store.sweep();
            if removed > 0 {
                debug!("Session sweep evicted {removed} expired entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_and_get() {
        let store = SessionStore::new(60);
        store.save("k1", json!({"email": "alice@example.com"}));

        let payload = store.get("k1").unwrap();
        assert_eq!(payload["email"], "alice@example.com");
        // get does not consume
        assert!(store.get("k1").is_some());
    }

    #[test]
    fn test_take_consumes_at_most_once() {
        let store = SessionStore::new(60);
        store.save("k1", json!({"step": 2}));

        assert!(store.take("k1").is_some());
        assert!(store.take("k1").is_none());
        assert!(store.get("k1").is_none());
    }

    #[test]
    fn test_expired_entries_read_as_absent() {
        let store = SessionStore::new(0); // immediate expiry
        store.save("k1", json!(1));

        assert!(store.get("k1").is_none());
        assert!(store.take("k1").is_none());
    }

    #[test]
    fn test_sweep_evicts_only_expired() {
        let expired_store = SessionStore::new(0);
        expired_store.save("k1", json!(1));
        expired_store.save("k2", json!(2));
        assert_eq!(expired_store.sweep(), 2);
        assert!(expired_store.is_empty());

        let fresh_store = SessionStore::new(600);
        fresh_store.save("k1", json!(1));
        assert_eq!(fresh_store.sweep(), 0);
        assert_eq!(fresh_store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new(60);
        store.save("k1", json!(1));
        store.remove("k1");
        assert!(store.get("k1").is_none());
    }

    #[tokio::test]
    async fn test_sweeper_task_evicts() {
        let store = Arc::new(SessionStore::new(0));
        store.save("k1", json!(1));

        let handle = spawn_sweeper(store.clone(), std::time::Duration::from_millis(10));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        handle.abort();

        assert!(store.is_empty());
    }
}
