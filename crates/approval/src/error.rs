//! Approval workflow errors

use custos_core::Permission;
use custos_ledger::TransactionStatus;
use thiserror::Error;

/// Errors from vote/execute/propose
#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("Administrator not found: {0}")]
    AdminNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Administrator {admin} lacks {permission} permission")]
    MissingPermission { admin: String, permission: Permission },

    #[error("Administrator {admin} is not listed on transaction {transaction}")]
    NotListed { admin: String, transaction: String },

    #[error("Administrator {0} is inactive")]
    InactiveAdmin(String),

    #[error("Transaction is {actual}, expected {expected}")]
    InvalidState {
        expected: TransactionStatus,
        actual: TransactionStatus,
    },

    #[error("Administrator {admin} already voted on transaction {transaction}")]
    AlreadyVoted { admin: String, transaction: String },

    #[error("No eligible administrators to list on the transaction")]
    NoEligibleAdmins,

    #[error("Ledger error: {0}")]
    Ledger(custos_ledger::StoreError),

    #[error("Registry error: {0}")]
    Registry(custos_registry::StoreError),
}

impl From<custos_ledger::StoreError> for ApprovalError {
    fn from(e: custos_ledger::StoreError) -> Self {
        match e {
            custos_ledger::StoreError::NotFound(id) => ApprovalError::TransactionNotFound(id),
            custos_ledger::StoreError::DuplicateVote {
                transaction_id,
                admin_id,
            } => ApprovalError::AlreadyVoted {
                admin: admin_id,
                transaction: transaction_id,
            },
            other => ApprovalError::Ledger(other),
        }
    }
}

impl From<custos_registry::StoreError> for ApprovalError {
    fn from(e: custos_registry::StoreError) -> Self {
        match e {
            custos_registry::StoreError::NotFound(id) => ApprovalError::AdminNotFound(id),
            other => ApprovalError::Registry(other),
        }
    }
}
