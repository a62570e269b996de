//! Command layer
//!
//! Thin functions over the application context. Every failure maps to a
//! stable error code plus a human-readable message; batch cleanup always
//! returns a structured report even when some items failed.

use thiserror::Error;

use custos_approval::{ApprovalError, VoteOutcome};
use custos_cleanup::{CleanupError, CleanupReport, CleanupStatus};
use custos_core::Permission;
use custos_custody::{AppliedPolicy, CustodyAccount, CustodyError};
use custos_ledger::{Transaction, VoteDecision};
use custos_registry::{AdminPatch, Administrator, NewAdmin, RegistryError};

use crate::context::AppContext;

/// A command failure: stable code plus human-readable message
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct CommandError {
    pub code: &'static str,
    pub message: String,
}

impl CommandError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<RegistryError> for CommandError {
    fn from(e: RegistryError) -> Self {
        let code = match &e {
            RegistryError::NotFound(_) => "NOT_FOUND",
            RegistryError::Conflict { .. } => "CONFLICT",
            RegistryError::Validation(_) | RegistryError::Key(_) => "INVALID_INPUT",
            RegistryError::Provisioning(_) => "UPSTREAM_FAILURE",
            RegistryError::Store(_) => "INTERNAL",
        };
        CommandError::new(code, e.to_string())
    }
}

impl From<ApprovalError> for CommandError {
    fn from(e: ApprovalError) -> Self {
        let code = match &e {
            ApprovalError::AdminNotFound(_) | ApprovalError::TransactionNotFound(_) => "NOT_FOUND",
            ApprovalError::MissingPermission { .. }
            | ApprovalError::NotListed { .. }
            | ApprovalError::InactiveAdmin(_) => "FORBIDDEN",
            ApprovalError::InvalidState { .. } | ApprovalError::NoEligibleAdmins => "INVALID_STATE",
            ApprovalError::AlreadyVoted { .. } => "CONFLICT",
            ApprovalError::Ledger(_) | ApprovalError::Registry(_) => "INTERNAL",
        };
        CommandError::new(code, e.to_string())
    }
}

impl From<CleanupError> for CommandError {
    fn from(e: CleanupError) -> Self {
        CommandError::new("INTERNAL", e.to_string())
    }
}

impl From<CustodyError> for CommandError {
    fn from(e: CustodyError) -> Self {
        let code = match &e {
            CustodyError::InsufficientSigners { .. } => "INVALID_STATE",
            CustodyError::Upstream(_) | CustodyError::Directory(_) => "UPSTREAM_FAILURE",
        };
        CommandError::new(code, e.to_string())
    }
}

// === Administrator commands ===

pub async fn create_admin(ctx: &AppContext, new: NewAdmin) -> Result<Administrator, CommandError> {
    Ok(ctx.registry.create(new).await?)
}

pub fn get_admin(ctx: &AppContext, id: &str) -> Result<Administrator, CommandError> {
    Ok(ctx.registry.get(id)?)
}

pub fn get_admin_by_email(ctx: &AppContext, email: &str) -> Result<Administrator, CommandError> {
    Ok(ctx.registry.get_by_email(email)?)
}

pub fn update_admin(
    ctx: &AppContext,
    id: &str,
    patch: AdminPatch,
) -> Result<Administrator, CommandError> {
    Ok(ctx.registry.update(id, patch)?)
}

pub fn delete_admin(ctx: &AppContext, id: &str) -> Result<(), CommandError> {
    Ok(ctx.registry.delete(id)?)
}

pub fn list_admins_by_permissions(
    ctx: &AppContext,
    permissions: &[Permission],
) -> Result<Vec<Administrator>, CommandError> {
    Ok(ctx.registry.find_by_permissions(permissions)?)
}

// === Transaction commands ===

pub fn propose_transaction(ctx: &AppContext, user_email: &str) -> Result<Transaction, CommandError> {
    Ok(ctx.workflow.propose(user_email)?)
}

pub fn vote(
    ctx: &AppContext,
    transaction_id: &str,
    admin_id: &str,
    decision: &str,
) -> Result<VoteOutcome, CommandError> {
    let decision = VoteDecision::parse(decision).ok_or_else(|| {
        CommandError::new(
            "INVALID_INPUT",
            format!("decision must be 'approve' or 'reject', got {decision:?}"),
        )
    })?;
    Ok(ctx.workflow.vote(transaction_id, admin_id, decision)?)
}

pub fn execute(
    ctx: &AppContext,
    transaction_id: &str,
    admin_id: &str,
) -> Result<Transaction, CommandError> {
    Ok(ctx.workflow.execute(transaction_id, admin_id)?)
}

// === Cleanup commands ===

/// Trigger an engine run now; partial failures are inside the report
pub async fn cleanup_run(ctx: &AppContext) -> Result<CleanupReport, CommandError> {
    Ok(ctx.cleanup_engine.run().await)
}

pub fn cleanup_status(ctx: &AppContext) -> Result<CleanupStatus, CommandError> {
    Ok(ctx.cleanup_engine.status()?)
}

// === Custody commands ===

/// Recompute and push the signer policy for one account
pub async fn reconcile_account(
    ctx: &AppContext,
    account: &CustodyAccount,
) -> Result<AppliedPolicy, CommandError> {
    let signers = ctx.registry.signer_entries()?;
    Ok(ctx.reconciler.reconcile_account(account, &signers).await?)
}
