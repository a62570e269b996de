//! Custody backend policy types

use serde::{Deserialize, Serialize};

/// A capability tag on a registered signer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignerPermission {
    Initiate,
    Vote,
    Execute,
}

/// One address registered with the custody backend, tagged with the subset
/// of operations it may co-sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerEntry {
    pub address: String,
    pub permissions: Vec<SignerPermission>,
}

impl SignerEntry {
    pub fn new(address: impl Into<String>, permissions: Vec<SignerPermission>) -> Self {
        Self {
            address: address.into(),
            permissions,
        }
    }

    /// The end-user's own signer entry: initiate only
    pub fn user(address: impl Into<String>) -> Self {
        Self::new(address, vec![SignerPermission::Initiate])
    }
}

/// The policy pushed to the backend for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPolicy {
    pub signers: Vec<SignerEntry>,
    pub threshold: u32,
    /// Time-lock in seconds, when the time-delay feature is enabled
    pub time_lock_secs: Option<u64>,
}

/// What the backend reports back after applying a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedPolicy {
    pub account_address: String,
    pub signer_count: usize,
    pub threshold: u32,
    pub time_lock_secs: Option<u64>,
}

/// An end-user custody account known to the account directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyAccount {
    pub user_email: String,
    pub wallet_address: String,
}

impl CustodyAccount {
    pub fn new(user_email: impl Into<String>, wallet_address: impl Into<String>) -> Self {
        Self {
            user_email: user_email.into(),
            wallet_address: wallet_address.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_signer_is_initiate_only() {
        let signer = SignerEntry::user("0xabc");
        assert_eq!(signer.permissions, vec![SignerPermission::Initiate]);
    }

    #[test]
    fn test_policy_serialization() {
        let policy = AccountPolicy {
            signers: vec![
                SignerEntry::user("addr-user"),
                SignerEntry::new("addr-admin", vec![SignerPermission::Vote, SignerPermission::Execute]),
            ],
            threshold: 2,
            time_lock_secs: Some(300),
        };

        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains("INITIATE"));
        assert!(json.contains(r#""threshold":2"#));

        let parsed: AccountPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, policy);
    }
}
