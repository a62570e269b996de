//! Custody interface errors

use thiserror::Error;

/// Errors from the custody backend interface and the reconciler
#[derive(Debug, Error)]
pub enum CustodyError {
    /// The backend call failed or returned unusable data
    #[error("Custody backend failure: {0}")]
    Upstream(String),

    /// The recomputed signer list is too small to be a sane policy
    #[error("Insufficient signers for account {account}: {count} (need at least 2)")]
    InsufficientSigners { account: String, count: usize },

    /// The account directory failed to enumerate accounts
    #[error("Account directory failure: {0}")]
    Directory(String),
}
