//! Cleanup scheduler
//!
//! An explicit service object constructed once at process start and held
//! in application state; no global instance. `start` runs the engine
//! immediately and then on the configured interval, `stop` halts the
//! timer and abandons any in-flight run (all engine mutations are
//! single-record writes, so abandonment is safe).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{info, warn};

use custos_core::InactivityConfig;

use crate::engine::InactivityEngine;

/// Drives the inactivity engine on a fixed interval
pub struct CleanupService {
    engine: Arc<InactivityEngine>,
    config: InactivityConfig,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl CleanupService {
    pub fn new(engine: Arc<InactivityEngine>, config: InactivityConfig) -> Self {
        Self {
            engine,
            config,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    /// Start the recurring timer. The first run fires immediately.
    pub fn start(&self) {
        if !self.config.enabled {
            info!("Inactivity cleanup is disabled; scheduler not started");
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let engine = self.engine.clone();
        let running = self.running.clone();
        let period = self.config.cleanup_interval().max(Duration::from_secs(1));

        info!(
            "Cleanup scheduler started (every {} minutes)",
            self.config.cleanup_interval_minutes
        );

        let handle = tokio::spawn(async move {
            let mut timer = interval(period);

            loop {
                timer.tick().await;

                if !running.load(Ordering::SeqCst) {
                    info!("Cleanup scheduler stopped");
                    break;
                }

                let report = engine.run().await;
                if !report.errors.is_empty() {
                    warn!(
                        "Cleanup run finished with {} errors: {:?}",
                        report.errors.len(),
                        report.errors
                    );
                }
            }
        });

        *self.handle.lock().unwrap() = Some(handle);
    }

    /// Stop the recurring timer. An in-flight run is abandoned.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle.abort();
        }
        info!("Cleanup scheduler stop requested");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for CleanupService {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custos_core::{GovernanceConfig, Permission, PermissionSet};
    use custos_custody::{MockCustodyBackend, MockDirectory, PolicyReconciler};
    use custos_ledger::{Transaction, TransactionStore};
    use custos_registry::{AdminStore, Administrator};
    use chrono::Utc;

    fn engine_with_idle_admin() -> (Arc<AdminStore>, Arc<InactivityEngine>) {
        let admins = Arc::new(AdminStore::in_memory().unwrap());
        let transactions = Arc::new(TransactionStore::in_memory().unwrap());
        let backend = Arc::new(MockCustodyBackend::new());
        let directory = Arc::new(MockDirectory::new());
        let config = GovernanceConfig::default();

        let now = Utc::now();
        admins
            .insert(&Administrator {
                id: "idle".to_string(),
                email: "idle@example.com".to_string(),
                first_name: "Idle".to_string(),
                last_name: "Admin".to_string(),
                wallet_address: None,
                public_key: None,
                secret_key: None,
                permissions: PermissionSet::from_slice(&[Permission::Vote, Permission::Execute]),
                is_active: true,
                last_activity_at: None,
                last_vote_activity_at: None,
                last_execute_activity_at: None,
                created_at: now,
                updated_at: now,
            })
            .unwrap();

        let mut tx = Transaction::new("user@example.com", vec!["idle@example.com".to_string()]);
        tx.created_at = now - chrono::Duration::hours(50);
        tx.updated_at = tx.created_at;
        transactions.insert(&tx).unwrap();

        let reconciler = Arc::new(PolicyReconciler::new(backend, config.clone()));
        let engine = Arc::new(InactivityEngine::new(
            admins.clone(),
            transactions,
            reconciler,
            directory,
            config,
        ));
        (admins, engine)
    }

    #[tokio::test]
    async fn test_disabled_service_does_not_start() {
        let (_, engine) = engine_with_idle_admin();
        let config = InactivityConfig {
            enabled: false,
            ..InactivityConfig::default()
        };
        let service = CleanupService::new(engine, config);

        service.start();
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn test_start_runs_immediately_then_stop() {
        let (admins, engine) = engine_with_idle_admin();
        let service = CleanupService::new(engine, InactivityConfig::default());

        service.start();
        assert!(service.is_running());

        // the first tick fires immediately; give it a moment to land
        tokio::time::sleep(Duration::from_millis(100)).await;

        let admin = admins.get("idle").unwrap();
        assert!(!admin.permissions.contains(Permission::Vote));

        service.stop();
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn test_start_twice_is_idempotent() {
        let (_, engine) = engine_with_idle_admin();
        let service = CleanupService::new(engine, InactivityConfig::default());

        service.start();
        service.start();
        assert!(service.is_running());
        service.stop();
    }
}
