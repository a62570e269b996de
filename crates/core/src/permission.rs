//! Administrator permission model

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum_macros::{Display, EnumString};

/// A governance capability an administrator may hold
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Propose a transaction on a custody account
    Initiate,
    /// Vote on a pending transaction
    Vote,
    /// Execute an approved transaction
    Execute,
    /// Manage end-user records
    ManageUsers,
    /// Manage administrator records
    ManageAdmins,
}

impl Permission {
    /// The capabilities that make an administrator a custody co-signer
    pub const SIGNING: [Permission; 2] = [Permission::Vote, Permission::Execute];
}

/// An administrator's set of capabilities
///
/// Ordered and deduplicated; cardinality bounds are enforced at the
/// validation layer, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn from_slice(permissions: &[Permission]) -> Self {
        Self(permissions.iter().copied().collect())
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    /// True if this set shares at least one capability with `other` (OR semantics)
    pub fn intersects(&self, other: &[Permission]) -> bool {
        other.iter().any(|p| self.0.contains(p))
    }

    /// The subset of this set that also appears in `other`
    pub fn intersection(&self, other: &[Permission]) -> Vec<Permission> {
        other.iter().copied().filter(|p| self.0.contains(p)).collect()
    }

    pub fn insert(&mut self, permission: Permission) -> bool {
        self.0.insert(permission)
    }

    pub fn remove(&mut self, permission: Permission) -> bool {
        self.0.remove(&permission)
    }

    /// Remove every capability in `revoked`, returning how many were present
    pub fn revoke_all(&mut self, revoked: &[Permission]) -> usize {
        revoked.iter().filter(|p| self.0.remove(p)).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<Permission> {
        self.0.iter().copied().collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_permission_string_forms() {
        assert_eq!(Permission::ManageAdmins.to_string(), "MANAGE_ADMINS");
        assert_eq!(Permission::Vote.to_string(), "VOTE");
        assert_eq!(Permission::from_str("EXECUTE").unwrap(), Permission::Execute);
        assert!(Permission::from_str("NOPE").is_err());
    }

    #[test]
    fn test_set_deduplicates() {
        let set = PermissionSet::from_slice(&[Permission::Vote, Permission::Vote, Permission::Execute]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_intersects_is_or_not_and() {
        let set = PermissionSet::from_slice(&[Permission::Execute]);
        assert!(set.intersects(&[Permission::Vote, Permission::Execute]));
        assert!(!set.intersects(&[Permission::Vote, Permission::Initiate]));
    }

    #[test]
    fn test_intersection_with_signing() {
        let set = PermissionSet::from_slice(&[Permission::Vote, Permission::ManageUsers]);
        assert_eq!(set.intersection(&Permission::SIGNING), vec![Permission::Vote]);
    }

    #[test]
    fn test_revoke_all() {
        let mut set = PermissionSet::from_slice(&[Permission::Vote, Permission::Execute]);
        let removed = set.revoke_all(&[Permission::Vote, Permission::Initiate]);
        assert_eq!(removed, 1);
        assert_eq!(set.to_vec(), vec![Permission::Execute]);
    }

    #[test]
    fn test_serde_screaming_snake() {
        let set = PermissionSet::from_slice(&[Permission::Vote, Permission::ManageAdmins]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["VOTE","MANAGE_ADMINS"]"#);

        let parsed: PermissionSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
    }
}
