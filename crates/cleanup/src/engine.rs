//! Inactivity revocation engine
//!
//! A capability is revoked only when the administrator had actionable work
//! available during the lookback window and did not act: pending
//! transactions for VOTE, approved transactions for EXECUTE. Recent
//! activity always retains the capability, regardless of backlog size.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use custos_core::{GovernanceConfig, Permission};
use custos_custody::{AccountDirectory, PolicyReconciler, SignerEntry};
use custos_ledger::{TransactionStatus, TransactionStore};
use custos_registry::{AdminStore, Administrator};

use crate::report::{CleanupReport, CleanupStatus};

/// Errors from engine queries (run itself absorbs failures into the report)
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Registry error: {0}")]
    Registry(#[from] custos_registry::StoreError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] custos_ledger::StoreError),
}

/// Scans administrators and revokes unused capabilities
pub struct InactivityEngine {
    admins: Arc<AdminStore>,
    transactions: Arc<TransactionStore>,
    reconciler: Arc<PolicyReconciler>,
    directory: Arc<dyn AccountDirectory>,
    config: GovernanceConfig,
}

impl InactivityEngine {
    pub fn new(
        admins: Arc<AdminStore>,
        transactions: Arc<TransactionStore>,
        reconciler: Arc<PolicyReconciler>,
        directory: Arc<dyn AccountDirectory>,
        config: GovernanceConfig,
    ) -> Self {
        Self {
            admins,
            transactions,
            reconciler,
            directory,
            config,
        }
    }

    /// One full engine pass: revoke, then reconcile every known account.
    ///
    /// Processes administrators sequentially; a single failure is recorded
    /// and the batch continues. Returns the aggregate report.
    pub async fn run(&self) -> CleanupReport {
        let mut report = CleanupReport::new();
        let cutoff = Utc::now() - self.config.inactivity.timeout();

        let admins = match self.admins.list_active() {
            Ok(admins) => admins,
            Err(e) => {
                report.errors.push(format!("failed to list administrators: {e}"));
                return report;
            }
        };

        for admin in admins {
            if !admin.permissions.intersects(&Permission::SIGNING) {
                continue;
            }
            report.admins_scanned += 1;

            let revoked = match self.revocations_for(&admin, cutoff) {
                Ok(revoked) => revoked,
                Err(e) => {
                    report
                        .errors
                        .push(format!("failed to evaluate {}: {e}", admin.email));
                    continue;
                }
            };
            if revoked.is_empty() {
                continue;
            }

            if let Err(e) = self.apply_revocation(admin.clone(), &revoked) {
                report
                    .errors
                    .push(format!("failed to revoke {:?} from {}: {e}", revoked, admin.email));
                continue;
            }
            report.admins_revoked += 1;
        }

        // the revocation is global: the administrator is a signer on every
        // account, so reconcile all of them once per run
        if report.admins_revoked > 0 {
            self.reconcile_all(&mut report).await;
        }

        info!(
            "Cleanup run: {} scanned, {} revoked, {} reconciled, {} errors",
            report.admins_scanned,
            report.admins_revoked,
            report.accounts_reconciled,
            report.errors.len()
        );
        report
    }

    /// Which capabilities a run at `cutoff` would take from this administrator
    fn revocations_for(
        &self,
        admin: &Administrator,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Permission>, CleanupError> {
        let mut revoked = Vec::new();

        if admin.permissions.contains(Permission::Vote)
            && idle_since(admin.last_vote_activity_at, cutoff)
            && self.transactions.has_stale_actionable(
                &admin.email,
                TransactionStatus::Pending,
                cutoff,
            )?
        {
            revoked.push(Permission::Vote);
        }

        if admin.permissions.contains(Permission::Execute)
            && idle_since(admin.last_execute_activity_at, cutoff)
            && self.transactions.has_stale_actionable(
                &admin.email,
                TransactionStatus::Approved,
                cutoff,
            )?
        {
            revoked.push(Permission::Execute);
        }

        Ok(revoked)
    }

    /// Persist the reduced permission set. An administrator left with no
    /// capabilities is deactivated instead of stored with an empty set.
    fn apply_revocation(
        &self,
        mut admin: Administrator,
        revoked: &[Permission],
    ) -> Result<(), CleanupError> {
        admin.permissions.revoke_all(revoked);
        if admin.permissions.is_empty() {
            admin.is_active = false;
        }
        admin.updated_at = Utc::now();
        self.admins.update(&admin)?;

        info!(
            "Revoked {:?} from {} (inactive past the {}h window){}",
            revoked,
            admin.email,
            self.config.inactivity.timeout_hours,
            if admin.is_active { "" } else { "; administrator deactivated" }
        );
        Ok(())
    }

    /// Push the recomputed policy to every account with a wallet address.
    /// Each account's failure is its own; the fan-out always completes.
    async fn reconcile_all(&self, report: &mut CleanupReport) {
        let signers = match self.signer_entries() {
            Ok(signers) => signers,
            Err(e) => {
                report.errors.push(format!("failed to load signer entries: {e}"));
                return;
            }
        };

        let accounts = match self.directory.custody_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                report.errors.push(format!("failed to list custody accounts: {e}"));
                return;
            }
        };

        for account in accounts {
            match self.reconciler.reconcile_account(&account, &signers).await {
                Ok(_) => report.accounts_reconciled += 1,
                Err(e) => {
                    warn!("Reconciliation failed for {}: {e}", account.wallet_address);
                    report
                        .errors
                        .push(format!("account {}: {e}", account.wallet_address));
                }
            }
        }
    }

    /// Signer entries of every active administrator holding INITIATE, VOTE
    /// or EXECUTE (the reconciler input)
    fn signer_entries(&self) -> Result<Vec<SignerEntry>, CleanupError> {
        Ok(self
            .admins
            .list_active()?
            .iter()
            .filter(|a| {
                a.permissions.intersects(&[
                    Permission::Initiate,
                    Permission::Vote,
                    Permission::Execute,
                ])
            })
            .filter_map(Administrator::signer_entry)
            .collect())
    }

    /// Dry-run status snapshot; mutates nothing
    pub fn status(&self) -> Result<CleanupStatus, CleanupError> {
        let cutoff = Utc::now() - self.config.inactivity.timeout();
        let mut inactive = 0;

        for admin in self.admins.list_active()? {
            if !admin.permissions.intersects(&Permission::SIGNING) {
                continue;
            }
            if !self.revocations_for(&admin, cutoff)?.is_empty() {
                inactive += 1;
            }
        }

        Ok(CleanupStatus {
            enabled: self.config.inactivity.enabled,
            inactive_admins_count: inactive,
            timeout_hours: self.config.inactivity.timeout_hours,
            cleanup_interval_minutes: self.config.inactivity.cleanup_interval_minutes,
        })
    }
}

/// Null or stale timestamps both count as idle
fn idle_since(last_activity: Option<DateTime<Utc>>, cutoff: DateTime<Utc>) -> bool {
    match last_activity {
        None => true,
        Some(at) => at <= cutoff,
    }
}
