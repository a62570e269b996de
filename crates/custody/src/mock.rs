//! Mock custody backend for testing
//!
//! Stores applied policies in memory and supports per-address failure
//! injection so reconciliation error paths can be exercised.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::backend::CustodyBackend;
use crate::error::CustodyError;
use crate::types::{AccountPolicy, AppliedPolicy};

/// In-memory custody backend
pub struct MockCustodyBackend {
    policies: RwLock<HashMap<String, AccountPolicy>>,
    failing_addresses: RwLock<HashSet<String>>,
    fail_creates: RwLock<bool>,
}

impl MockCustodyBackend {
    pub fn new() -> Self {
        Self {
            policies: RwLock::new(HashMap::new()),
            failing_addresses: RwLock::new(HashSet::new()),
            fail_creates: RwLock::new(false),
        }
    }

    /// Make updates for one address fail (for partial-failure tests)
    pub fn set_failing(&self, address: impl Into<String>) {
        self.failing_addresses.write().unwrap().insert(address.into());
    }

    pub fn clear_failing(&self, address: &str) {
        self.failing_addresses.write().unwrap().remove(address);
    }

    /// Make every create_account call fail
    pub fn set_fail_creates(&self, failing: bool) {
        *self.fail_creates.write().unwrap() = failing;
    }

    /// The last policy applied to an address, if any
    pub fn policy_for(&self, address: &str) -> Option<AccountPolicy> {
        self.policies.read().unwrap().get(address).cloned()
    }

    pub fn account_count(&self) -> usize {
        self.policies.read().unwrap().len()
    }
}

impl Default for MockCustodyBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn applied(address: &str, policy: &AccountPolicy) -> AppliedPolicy {
    AppliedPolicy {
        account_address: address.to_string(),
        signer_count: policy.signers.len(),
        threshold: policy.threshold,
        time_lock_secs: policy.time_lock_secs,
    }
}

#[async_trait]
impl CustodyBackend for MockCustodyBackend {
    async fn create_account(&self, policy: &AccountPolicy) -> Result<AppliedPolicy, CustodyError> {
        if *self.fail_creates.read().unwrap() {
            return Err(CustodyError::Upstream("account provisioning rejected".to_string()));
        }

        let address = format!("acct-{}", &uuid::Uuid::new_v4().to_string()[..8]);
        self.policies
            .write()
            .unwrap()
            .insert(address.clone(), policy.clone());
        Ok(applied(&address, policy))
    }

    async fn update_account(
        &self,
        address: &str,
        policy: &AccountPolicy,
    ) -> Result<AppliedPolicy, CustodyError> {
        if self.failing_addresses.read().unwrap().contains(address) {
            return Err(CustodyError::Upstream(format!(
                "policy update rejected for {address}"
            )));
        }

        self.policies
            .write()
            .unwrap()
            .insert(address.to_string(), policy.clone());
        Ok(applied(address, policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SignerEntry, SignerPermission};

    fn sample_policy() -> AccountPolicy {
        AccountPolicy {
            signers: vec![
                SignerEntry::user("addr-user"),
                SignerEntry::new("addr-admin", vec![SignerPermission::Vote]),
            ],
            threshold: 2,
            time_lock_secs: None,
        }
    }

    #[tokio::test]
    async fn test_create_returns_address() {
        let backend = MockCustodyBackend::new();
        let result = backend.create_account(&sample_policy()).await.unwrap();

        assert!(result.account_address.starts_with("acct-"));
        assert_eq!(result.signer_count, 2);
        assert_eq!(backend.account_count(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_injection() {
        let backend = MockCustodyBackend::new();
        backend.set_fail_creates(true);

        let result = backend.create_account(&sample_policy()).await;
        assert!(matches!(result, Err(CustodyError::Upstream(_))));
        assert_eq!(backend.account_count(), 0);
    }

    #[tokio::test]
    async fn test_update_stores_policy() {
        let backend = MockCustodyBackend::new();
        let policy = sample_policy();

        backend.update_account("addr-1", &policy).await.unwrap();
        assert_eq!(backend.policy_for("addr-1"), Some(policy));
    }

    #[tokio::test]
    async fn test_update_failure_is_per_address() {
        let backend = MockCustodyBackend::new();
        backend.set_failing("addr-bad");

        let policy = sample_policy();
        assert!(backend.update_account("addr-bad", &policy).await.is_err());
        assert!(backend.update_account("addr-good", &policy).await.is_ok());
    }
}
