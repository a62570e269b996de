//! Cleanup run reporting

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregate result of one engine run.
///
/// Always structured, even when some items failed; partial failure is
/// reported per item, never as an opaque whole-run error.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    /// Active administrators examined
    pub admins_scanned: usize,
    /// Administrators that lost at least one capability
    pub admins_revoked: usize,
    /// Accounts whose custody policy was pushed successfully
    pub accounts_reconciled: usize,
    /// Per-item failure messages, in processing order
    pub errors: Vec<String>,
    pub ran_at: DateTime<Utc>,
}

impl CleanupReport {
    pub fn new() -> Self {
        Self {
            admins_scanned: 0,
            admins_revoked: 0,
            accounts_reconciled: 0,
            errors: Vec::new(),
            ran_at: Utc::now(),
        }
    }
}

impl Default for CleanupReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot returned by the status query
#[derive(Debug, Clone, Serialize)]
pub struct CleanupStatus {
    pub enabled: bool,
    /// Administrators that a run right now would revoke (dry-run scan)
    pub inactive_admins_count: usize,
    pub timeout_hours: i64,
    pub cleanup_interval_minutes: u64,
}
