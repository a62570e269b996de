//! Activity tracker
//!
//! Best-effort bookkeeping of when an administrator last acted. A failed
//! touch is logged and absorbed; it never fails the vote/execute/update
//! call that triggered it.

use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

use crate::store::AdminStore;

/// What kind of action is being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Generic,
    Vote,
    Execute,
}

/// Records administrator activity timestamps
#[derive(Clone)]
pub struct ActivityTracker {
    store: Arc<AdminStore>,
}

impl ActivityTracker {
    pub fn new(store: Arc<AdminStore>) -> Self {
        Self { store }
    }

    /// Record an action now. Always also updates the generic
    /// `last_activity_at` timestamp.
    pub fn touch(&self, admin_id: &str, kind: ActivityKind) {
        if let Err(e) = self.store.touch(admin_id, kind, Utc::now()) {
            warn!("Failed to record {kind:?} activity for {admin_id}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::Administrator;
    use custos_core::{Permission, PermissionSet};

    fn seeded_store() -> Arc<AdminStore> {
        let store = Arc::new(AdminStore::in_memory().unwrap());
        let now = Utc::now();
        store
            .insert(&Administrator {
                id: "a1".to_string(),
                email: "alice@example.com".to_string(),
                first_name: "Alice".to_string(),
                last_name: "Nguyen".to_string(),
                wallet_address: None,
                public_key: None,
                secret_key: None,
                permissions: PermissionSet::from_slice(&[Permission::Vote]),
                is_active: true,
                last_activity_at: None,
                last_vote_activity_at: None,
                last_execute_activity_at: None,
                created_at: now,
                updated_at: now,
            })
            .unwrap();
        store
    }

    #[test]
    fn test_touch_records_timestamps() {
        let store = seeded_store();
        let tracker = ActivityTracker::new(store.clone());

        tracker.touch("a1", ActivityKind::Execute);

        let admin = store.get("a1").unwrap();
        assert!(admin.last_execute_activity_at.is_some());
        assert!(admin.last_activity_at.is_some());
        assert!(admin.last_vote_activity_at.is_none());
    }

    #[test]
    fn test_touch_unknown_admin_is_absorbed() {
        let tracker = ActivityTracker::new(seeded_store());
        // must not panic or error
        tracker.touch("ghost", ActivityKind::Vote);
    }
}
