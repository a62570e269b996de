//! Approval workflow logic

use std::sync::Arc;
use tracing::info;

use custos_core::{GovernanceConfig, Permission};
use custos_ledger::{
    Transaction, TransactionStatus, TransactionStore, VoteDecision, VoteRecord,
};
use custos_registry::{ActivityKind, ActivityTracker, AdminStore, Administrator};

use crate::error::ApprovalError;

/// Result of a recorded vote
#[derive(Debug, Clone, serde::Serialize)]
pub struct VoteOutcome {
    pub transaction_id: String,
    pub decision: VoteDecision,
    /// Transaction status after the vote was applied
    pub status: TransactionStatus,
    /// Approve votes recorded so far
    pub approvals: usize,
    /// Approvals required for this transaction
    pub quorum: usize,
}

/// Transaction approval state machine
pub struct ApprovalWorkflow {
    admins: Arc<AdminStore>,
    transactions: Arc<TransactionStore>,
    tracker: ActivityTracker,
    config: GovernanceConfig,
}

impl ApprovalWorkflow {
    pub fn new(
        admins: Arc<AdminStore>,
        transactions: Arc<TransactionStore>,
        config: GovernanceConfig,
    ) -> Self {
        let tracker = ActivityTracker::new(admins.clone());
        Self {
            admins,
            transactions,
            tracker,
            config,
        }
    }

    /// Open a pending transaction for an end-user action, listing every
    /// active administrator holding VOTE or EXECUTE as entitled actors.
    pub fn propose(&self, user_email: &str) -> Result<Transaction, ApprovalError> {
        let admin_emails: Vec<String> = self
            .admins
            .list_active()?
            .into_iter()
            .filter(|a| a.permissions.intersects(&[Permission::Vote, Permission::Execute]))
            .map(|a| a.email)
            .collect();

        if admin_emails.is_empty() {
            return Err(ApprovalError::NoEligibleAdmins);
        }

        let tx = Transaction::new(user_email, admin_emails);
        self.transactions.insert(&tx)?;
        info!(
            "Opened transaction {} for {} ({} admins listed)",
            tx.id,
            user_email,
            tx.admin_emails.len()
        );
        Ok(tx)
    }

    /// Record an administrator's vote on a pending transaction.
    ///
    /// A reject moves the transaction to REJECTED immediately; approvals
    /// reaching the quorum move it to APPROVED. Both transitions are
    /// conditional writes, so a concurrent vote can never double-transition
    /// the record.
    pub fn vote(
        &self,
        transaction_id: &str,
        admin_id: &str,
        decision: VoteDecision,
    ) -> Result<VoteOutcome, ApprovalError> {
        let admin = self.load_admin(admin_id)?;
        self.require_permission(&admin, Permission::Vote)?;

        let tx = self.transactions.get(transaction_id)?;
        self.require_listed(&admin, &tx)?;
        require_status(&tx, TransactionStatus::Pending)?;

        self.transactions.record_vote(&VoteRecord {
            transaction_id: tx.id.clone(),
            admin_id: admin.id.clone(),
            admin_email: admin.email.clone(),
            decision,
            voted_at: chrono::Utc::now(),
        })?;

        let approvals = self.transactions.count_approvals(&tx.id)?;
        let quorum = self.quorum_for(&tx);

        let status = match decision {
            VoteDecision::Reject => {
                if !self.transactions.transition(
                    &tx.id,
                    TransactionStatus::Pending,
                    TransactionStatus::Rejected,
                )? {
                    let actual = self.transactions.get(&tx.id)?.status;
                    return Err(ApprovalError::InvalidState {
                        expected: TransactionStatus::Pending,
                        actual,
                    });
                }
                info!("Transaction {} rejected by {}", tx.id, admin.email);
                TransactionStatus::Rejected
            }
            VoteDecision::Approve => {
                if approvals >= quorum {
                    // the flip may already have happened concurrently;
                    // report whatever status is stored
                    self.transactions.transition(
                        &tx.id,
                        TransactionStatus::Pending,
                        TransactionStatus::Approved,
                    )?;
                    let status = self.transactions.get(&tx.id)?.status;
                    if status == TransactionStatus::Approved {
                        info!(
                            "Transaction {} approved ({approvals}/{quorum} votes)",
                            tx.id
                        );
                    }
                    status
                } else {
                    TransactionStatus::Pending
                }
            }
        };

        self.tracker.touch(&admin.id, ActivityKind::Vote);

        Ok(VoteOutcome {
            transaction_id: tx.id,
            decision,
            status,
            approvals,
            quorum,
        })
    }

    /// Execute an approved transaction. Irreversible; a second execute
    /// observes EXECUTED and fails.
    pub fn execute(
        &self,
        transaction_id: &str,
        admin_id: &str,
    ) -> Result<Transaction, ApprovalError> {
        let admin = self.load_admin(admin_id)?;
        self.require_permission(&admin, Permission::Execute)?;

        let tx = self.transactions.get(transaction_id)?;
        self.require_listed(&admin, &tx)?;
        require_status(&tx, TransactionStatus::Approved)?;

        if !self.transactions.transition(
            &tx.id,
            TransactionStatus::Approved,
            TransactionStatus::Executed,
        )? {
            let actual = self.transactions.get(&tx.id)?.status;
            return Err(ApprovalError::InvalidState {
                expected: TransactionStatus::Approved,
                actual,
            });
        }

        self.tracker.touch(&admin.id, ActivityKind::Execute);
        info!("Transaction {} executed by {}", tx.id, admin.email);

        Ok(self.transactions.get(&tx.id)?)
    }

    /// Approvals required for a transaction: the configured threshold,
    /// clamped so a short admin list can still reach quorum.
    fn quorum_for(&self, tx: &Transaction) -> usize {
        (self.config.voting_threshold as usize).min(tx.admin_emails.len()).max(1)
    }

    fn load_admin(&self, admin_id: &str) -> Result<Administrator, ApprovalError> {
        let admin = self.admins.get(admin_id)?;
        if !admin.is_active {
            return Err(ApprovalError::InactiveAdmin(admin.email));
        }
        Ok(admin)
    }

    fn require_permission(
        &self,
        admin: &Administrator,
        permission: Permission,
    ) -> Result<(), ApprovalError> {
        if !admin.permissions.contains(permission) {
            return Err(ApprovalError::MissingPermission {
                admin: admin.email.clone(),
                permission,
            });
        }
        Ok(())
    }

    fn require_listed(&self, admin: &Administrator, tx: &Transaction) -> Result<(), ApprovalError> {
        if !tx.lists_admin(&admin.email) {
            return Err(ApprovalError::NotListed {
                admin: admin.email.clone(),
                transaction: tx.id.clone(),
            });
        }
        Ok(())
    }
}

fn require_status(tx: &Transaction, expected: TransactionStatus) -> Result<(), ApprovalError> {
    if tx.status != expected {
        return Err(ApprovalError::InvalidState {
            expected,
            actual: tx.status,
        });
    }
    Ok(())
}
