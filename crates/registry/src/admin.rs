//! Administrator records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use custos_core::{Permission, PermissionSet};
use custos_custody::{SignerEntry, SignerPermission};

/// An administrator holding a subset of governance capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Administrator {
    /// Unique identifier
    pub id: String,

    /// Unique email, the identity used on transaction admin lists
    pub email: String,

    pub first_name: String,
    pub last_name: String,

    /// Custody signer address, unique when present
    pub wallet_address: Option<String>,

    /// Hex-encoded ed25519 public key
    pub public_key: Option<String>,

    /// Hex-encoded ed25519 secret key; never serialized or logged
    #[serde(skip_serializing, default)]
    pub secret_key: Option<String>,

    pub permissions: PermissionSet,

    /// Inactive administrators are excluded from all eligibility computations
    pub is_active: bool,

    /// Owned by the activity tracker
    pub last_activity_at: Option<DateTime<Utc>>,
    pub last_vote_activity_at: Option<DateTime<Utc>>,
    pub last_execute_activity_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Administrator {
    /// The custody signer entry this administrator contributes to a user's
    /// account policy: public key (wallet address fallback), restricted to
    /// the intersection of their permissions with {VOTE, EXECUTE}.
    /// Administrators never receive INITIATE on a user's account.
    pub fn signer_entry(&self) -> Option<SignerEntry> {
        let address = self
            .public_key
            .clone()
            .or_else(|| self.wallet_address.clone())?;

        let permissions: Vec<SignerPermission> = self
            .permissions
            .intersection(&Permission::SIGNING)
            .into_iter()
            .map(|p| match p {
                Permission::Vote => SignerPermission::Vote,
                _ => SignerPermission::Execute,
            })
            .collect();

        Some(SignerEntry::new(address, permissions))
    }
}

/// Input for creating an administrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdmin {
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    /// Pre-existing signer address; mutually exclusive with keypair generation
    #[serde(default)]
    pub wallet_address: Option<String>,

    pub permissions: Vec<Permission>,

    /// Generate (or import) a signing keypair and provision a custody
    /// signer entry for this administrator
    #[serde(default)]
    pub generate_keypair: bool,

    /// Imported secret key material (64 hex chars); implies provisioning
    #[serde(default)]
    pub secret_key: Option<String>,
}

/// Partial update for an administrator; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminPatch {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub permissions: Option<Vec<Permission>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_admin(permissions: &[Permission]) -> Administrator {
        let now = Utc::now();
        Administrator {
            id: "admin-1".to_string(),
            email: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Nguyen".to_string(),
            wallet_address: Some("addr-wallet".to_string()),
            public_key: Some("pk-hex".to_string()),
            secret_key: None,
            permissions: PermissionSet::from_slice(permissions),
            is_active: true,
            last_activity_at: None,
            last_vote_activity_at: None,
            last_execute_activity_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_signer_entry_prefers_public_key() {
        let admin = sample_admin(&[Permission::Vote, Permission::Execute]);
        let entry = admin.signer_entry().unwrap();

        assert_eq!(entry.address, "pk-hex");
        assert_eq!(
            entry.permissions,
            vec![SignerPermission::Vote, SignerPermission::Execute]
        );
    }

    #[test]
    fn test_signer_entry_falls_back_to_wallet() {
        let mut admin = sample_admin(&[Permission::Vote]);
        admin.public_key = None;

        let entry = admin.signer_entry().unwrap();
        assert_eq!(entry.address, "addr-wallet");
        assert_eq!(entry.permissions, vec![SignerPermission::Vote]);
    }

    #[test]
    fn test_signer_entry_never_grants_initiate() {
        let admin = sample_admin(&[Permission::Initiate, Permission::Vote]);
        let entry = admin.signer_entry().unwrap();

        assert_eq!(entry.permissions, vec![SignerPermission::Vote]);
    }

    #[test]
    fn test_signer_entry_none_without_addresses() {
        let mut admin = sample_admin(&[Permission::Vote]);
        admin.public_key = None;
        admin.wallet_address = None;

        assert!(admin.signer_entry().is_none());
    }

    #[test]
    fn test_secret_key_not_serialized() {
        let mut admin = sample_admin(&[Permission::Vote]);
        admin.secret_key = Some("deadbeef".to_string());

        let json = serde_json::to_string(&admin).unwrap();
        assert!(!json.contains("deadbeef"));
    }
}
