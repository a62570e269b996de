//! Custody policy reconciler
//!
//! Recomputes the authoritative signer list and quorum threshold for one
//! end-user account and pushes it to the custody backend. The caller
//! supplies the signer entries of the currently qualifying administrators;
//! the end-user's own initiate-only entry is prepended here.

use std::sync::Arc;
use tracing::{debug, warn};

use custos_core::GovernanceConfig;

use crate::backend::CustodyBackend;
use crate::error::CustodyError;
use crate::types::{AccountPolicy, AppliedPolicy, CustodyAccount, SignerEntry};

/// Recomputes and pushes signer/threshold policies
pub struct PolicyReconciler {
    backend: Arc<dyn CustodyBackend>,
    config: GovernanceConfig,
}

impl PolicyReconciler {
    pub fn new(backend: Arc<dyn CustodyBackend>, config: GovernanceConfig) -> Self {
        Self { backend, config }
    }

    /// Build the policy for one account from the qualifying administrators'
    /// signer entries.
    ///
    /// The user's own wallet address leads the list with INITIATE only;
    /// signers with empty addresses are dropped; fewer than 2 remaining
    /// signers aborts with `InsufficientSigners`.
    pub fn build_policy(
        &self,
        account: &CustodyAccount,
        admin_signers: &[SignerEntry],
    ) -> Result<AccountPolicy, CustodyError> {
        let mut signers = Vec::with_capacity(admin_signers.len() + 1);
        signers.push(SignerEntry::user(account.wallet_address.clone()));
        signers.extend(admin_signers.iter().cloned());
        signers.retain(|s| !s.address.is_empty());

        if signers.len() < 2 {
            return Err(CustodyError::InsufficientSigners {
                account: account.wallet_address.clone(),
                count: signers.len(),
            });
        }

        let threshold = self.config.effective_threshold(signers.len() as u32);

        Ok(AccountPolicy {
            signers,
            threshold,
            time_lock_secs: self.config.effective_delay_seconds(),
        })
    }

    /// Recompute and push the policy for one account.
    ///
    /// A failed push is this account's failure only; callers fan out per
    /// account and collect results independently.
    pub async fn reconcile_account(
        &self,
        account: &CustodyAccount,
        admin_signers: &[SignerEntry],
    ) -> Result<AppliedPolicy, CustodyError> {
        let policy = match self.build_policy(account, admin_signers) {
            Ok(policy) => policy,
            Err(e @ CustodyError::InsufficientSigners { .. }) => {
                warn!("Skipping policy push for {}: {}", account.wallet_address, e);
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        debug!(
            "Pushing policy for {}: {} signers, threshold {}",
            account.wallet_address,
            policy.signers.len(),
            policy.threshold
        );
        self.backend
            .update_account(&account.wallet_address, &policy)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCustodyBackend;
    use crate::types::SignerPermission;

    fn reconciler_with(config: GovernanceConfig) -> (Arc<MockCustodyBackend>, PolicyReconciler) {
        let backend = Arc::new(MockCustodyBackend::new());
        let reconciler = PolicyReconciler::new(backend.clone(), config);
        (backend, reconciler)
    }

    fn admin_signer(address: &str) -> SignerEntry {
        SignerEntry::new(address, vec![SignerPermission::Vote, SignerPermission::Execute])
    }

    fn account() -> CustodyAccount {
        CustodyAccount::new("user@example.com", "addr-user")
    }

    #[test]
    fn test_user_signer_leads_with_initiate_only() {
        let (_, reconciler) = reconciler_with(GovernanceConfig::default());
        let policy = reconciler
            .build_policy(&account(), &[admin_signer("addr-admin")])
            .unwrap();

        assert_eq!(policy.signers[0].address, "addr-user");
        assert_eq!(policy.signers[0].permissions, vec![SignerPermission::Initiate]);
        assert_eq!(policy.signers[1].address, "addr-admin");
    }

    #[test]
    fn test_empty_addresses_dropped() {
        let (_, reconciler) = reconciler_with(GovernanceConfig::default());
        let policy = reconciler
            .build_policy(
                &account(),
                &[admin_signer(""), admin_signer("addr-a"), admin_signer("addr-b")],
            )
            .unwrap();

        assert_eq!(policy.signers.len(), 3);
        assert!(policy.signers.iter().all(|s| !s.address.is_empty()));
    }

    #[test]
    fn test_fewer_than_two_signers_aborts() {
        let (_, reconciler) = reconciler_with(GovernanceConfig::default());
        let result = reconciler.build_policy(&account(), &[]);

        assert!(matches!(
            result,
            Err(CustodyError::InsufficientSigners { count: 1, .. })
        ));
    }

    #[test]
    fn test_threshold_two_signers_default_config() {
        // Scenario: 1 qualifying admin + user signer = 2 signers,
        // votingThreshold=2, maxThreshold=10 -> threshold 2
        let (_, reconciler) = reconciler_with(GovernanceConfig::default());
        let policy = reconciler
            .build_policy(&account(), &[admin_signer("addr-admin")])
            .unwrap();

        assert_eq!(policy.threshold, 2);
    }

    #[test]
    fn test_threshold_never_exceeds_signer_count() {
        let config = GovernanceConfig {
            voting_threshold: 5,
            ..GovernanceConfig::default()
        };
        let (_, reconciler) = reconciler_with(config);
        let policy = reconciler
            .build_policy(&account(), &[admin_signer("addr-a"), admin_signer("addr-b")])
            .unwrap();

        assert_eq!(policy.threshold, 3);
    }

    #[test]
    fn test_time_lock_attached_when_enabled() {
        let mut config = GovernanceConfig::default();
        config.time_delay.enabled = true;
        config.time_delay.delay_seconds = 30; // below min, clamps up to 60
        let (_, reconciler) = reconciler_with(config);

        let policy = reconciler
            .build_policy(&account(), &[admin_signer("addr-admin")])
            .unwrap();
        assert_eq!(policy.time_lock_secs, Some(60));
    }

    #[tokio::test]
    async fn test_reconcile_pushes_to_backend() {
        let (backend, reconciler) = reconciler_with(GovernanceConfig::default());

        let applied = reconciler
            .reconcile_account(&account(), &[admin_signer("addr-admin")])
            .await
            .unwrap();

        assert_eq!(applied.account_address, "addr-user");
        assert_eq!(applied.threshold, 2);
        assert!(backend.policy_for("addr-user").is_some());
    }

    #[tokio::test]
    async fn test_reconcile_insufficient_signers_pushes_nothing() {
        let (backend, reconciler) = reconciler_with(GovernanceConfig::default());

        let result = reconciler.reconcile_account(&account(), &[]).await;
        assert!(matches!(result, Err(CustodyError::InsufficientSigners { .. })));
        assert!(backend.policy_for("addr-user").is_none());
    }
}
