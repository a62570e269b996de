//! Application context - wires everything together

use std::path::Path;
use std::sync::Arc;

use custos_approval::ApprovalWorkflow;
use custos_cleanup::{CleanupService, InactivityEngine};
use custos_core::GovernanceConfig;
use custos_custody::{AccountDirectory, CustodyBackend, PolicyReconciler};
use custos_ledger::TransactionStore;
use custos_registry::{AdminRegistry, AdminStore};
use custos_sessions::SessionStore;

/// Onboarding sessions expire after 15 minutes
const SESSION_TTL_SECS: i64 = 900;

/// Application context holding every governance component in explicit
/// state; constructed once at process start.
pub struct AppContext {
    pub config: GovernanceConfig,
    pub admins: Arc<AdminStore>,
    pub transactions: Arc<TransactionStore>,
    pub registry: AdminRegistry,
    pub workflow: ApprovalWorkflow,
    pub reconciler: Arc<PolicyReconciler>,
    pub cleanup_engine: Arc<InactivityEngine>,
    pub cleanup: CleanupService,
    pub sessions: Arc<SessionStore>,
}

impl AppContext {
    /// Build a context with file-backed stores under `data_path`
    pub fn new(
        data_path: impl AsRef<Path>,
        config: GovernanceConfig,
        backend: Arc<dyn CustodyBackend>,
        directory: Arc<dyn AccountDirectory>,
    ) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref();
        std::fs::create_dir_all(data_path)?;

        let admins = Arc::new(AdminStore::new(data_path.join("admins.db"))?);
        let transactions = Arc::new(TransactionStore::new(data_path.join("transactions.db"))?);

        Ok(Self::wire(admins, transactions, config, backend, directory))
    }

    /// Build a context over in-memory stores (for testing)
    pub fn in_memory(
        config: GovernanceConfig,
        backend: Arc<dyn CustodyBackend>,
        directory: Arc<dyn AccountDirectory>,
    ) -> Result<Self, anyhow::Error> {
        let admins = Arc::new(AdminStore::in_memory()?);
        let transactions = Arc::new(TransactionStore::in_memory()?);

        Ok(Self::wire(admins, transactions, config, backend, directory))
    }

    fn wire(
        admins: Arc<AdminStore>,
        transactions: Arc<TransactionStore>,
        config: GovernanceConfig,
        backend: Arc<dyn CustodyBackend>,
        directory: Arc<dyn AccountDirectory>,
    ) -> Self {
        let registry = AdminRegistry::new(admins.clone(), backend.clone(), config.clone());
        let workflow = ApprovalWorkflow::new(admins.clone(), transactions.clone(), config.clone());
        let reconciler = Arc::new(PolicyReconciler::new(backend, config.clone()));
        let cleanup_engine = Arc::new(InactivityEngine::new(
            admins.clone(),
            transactions.clone(),
            reconciler.clone(),
            directory,
            config.clone(),
        ));
        let cleanup = CleanupService::new(cleanup_engine.clone(), config.inactivity.clone());
        let sessions = Arc::new(SessionStore::new(SESSION_TTL_SECS));

        Self {
            config,
            admins,
            transactions,
            registry,
            workflow,
            reconciler,
            cleanup_engine,
            cleanup,
            sessions,
        }
    }
}
