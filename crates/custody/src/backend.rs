//! Custody backend trait - interface to the external policy store

use async_trait::async_trait;

use crate::error::CustodyError;
use crate::types::{AccountPolicy, AppliedPolicy};

/// The external wallet/policy backend holding each account's signer set
///
/// Implementations can be:
/// - MockCustodyBackend: in-memory, for tests and local runs
/// - An HTTP client against the production custody service
#[async_trait]
pub trait CustodyBackend: Send + Sync {
    /// Create a new account governed by the given policy.
    /// Returns the new account address with the applied policy.
    async fn create_account(&self, policy: &AccountPolicy) -> Result<AppliedPolicy, CustodyError>;

    /// Replace the signer/threshold policy for an existing account
    async fn update_account(
        &self,
        address: &str,
        policy: &AccountPolicy,
    ) -> Result<AppliedPolicy, CustodyError>;
}
