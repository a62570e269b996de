//! Administrator registry service
//!
//! Owns the administrator lifecycle: validated creation with optional
//! custody signer provisioning, partial updates with enumerated conflict
//! reporting, deletion, and permission queries.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use custos_core::{
    validate_email, validate_name, validate_permission_count, validate_secret_key,
    validate_wallet_address, GovernanceConfig, Permission, PermissionSet, ValidationError,
};
use custos_custody::{
    AccountPolicy, CustodyBackend, CustodyError, SignerEntry, SignerPermission,
};

use crate::admin::{AdminPatch, Administrator, NewAdmin};
use crate::keys::{AdminKeypair, KeyError};
use crate::store::{AdminStore, StoreError};

/// Errors from registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Administrator not found: {0}")]
    NotFound(String),

    #[error("Conflict on fields: {}", fields.join(", "))]
    Conflict { fields: Vec<&'static str> },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Key(#[from] KeyError),

    /// Remote signer provisioning failed; the administrator was not persisted
    #[error("Custody provisioning failed: {0}")]
    Provisioning(#[from] CustodyError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RegistryError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => RegistryError::NotFound(id),
            other => RegistryError::Store(other),
        }
    }
}

/// Administrator registry
pub struct AdminRegistry {
    store: Arc<AdminStore>,
    custody: Arc<dyn CustodyBackend>,
    config: GovernanceConfig,
}

impl AdminRegistry {
    pub fn new(
        store: Arc<AdminStore>,
        custody: Arc<dyn CustodyBackend>,
        config: GovernanceConfig,
    ) -> Self {
        Self {
            store,
            custody,
            config,
        }
    }

    /// Create an administrator.
    ///
    /// When a keypair is requested (generated or imported), a custody signer
    /// entry scoped to {VOTE, EXECUTE} is provisioned remotely first and the
    /// resulting account address persisted with the record. A failed remote
    /// call aborts the create; nothing is persisted.
    pub async fn create(&self, new: NewAdmin) -> Result<Administrator, RegistryError> {
        validate_email(&new.email)?;
        validate_name("first_name", &new.first_name)?;
        validate_name("last_name", &new.last_name)?;
        validate_permission_count(
            PermissionSet::from_slice(&new.permissions).len(),
            self.config.max_permissions,
        )?;

        let wallet_address = new.wallet_address.filter(|a| !a.is_empty());
        if let Some(ref address) = wallet_address {
            validate_wallet_address(address)?;
        }
        if let Some(ref secret) = new.secret_key {
            validate_secret_key(secret)?;
        }

        self.check_conflicts(&new.email, wallet_address.as_deref(), None)?;

        let mut admin = Administrator {
            id: Uuid::new_v4().to_string(),
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            wallet_address,
            public_key: None,
            secret_key: None,
            permissions: PermissionSet::from_slice(&new.permissions),
            is_active: true,
            last_activity_at: None,
            last_vote_activity_at: None,
            last_execute_activity_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        if new.generate_keypair || new.secret_key.is_some() {
            let keypair = match new.secret_key {
                Some(ref secret) => AdminKeypair::from_secret_hex(secret)?,
                None => AdminKeypair::generate(),
            };

            let applied = self.provision_signer(&keypair).await?;
            admin.wallet_address = Some(applied.account_address);
            admin.public_key = Some(keypair.public_hex);
            admin.secret_key = Some(keypair.secret_hex);
        }

        self.store.insert(&admin).map_err(map_unique_violation)?;
        info!("Created administrator {} <{}>", admin.id, admin.email);
        Ok(admin)
    }

    /// Provision the administrator's own signer entry with the custody
    /// backend. Initiate is reserved for end-users, so the entry is scoped
    /// to {VOTE, EXECUTE}.
    async fn provision_signer(
        &self,
        keypair: &AdminKeypair,
    ) -> Result<custos_custody::AppliedPolicy, RegistryError> {
        let policy = AccountPolicy {
            signers: vec![SignerEntry::new(
                keypair.public_hex.clone(),
                vec![SignerPermission::Vote, SignerPermission::Execute],
            )],
            threshold: 1,
            time_lock_secs: None,
        };
        Ok(self.custody.create_account(&policy).await?)
    }

    /// Get an administrator by id
    pub fn get(&self, id: &str) -> Result<Administrator, RegistryError> {
        Ok(self.store.get(id)?)
    }

    /// Get an administrator by email
    pub fn get_by_email(&self, email: &str) -> Result<Administrator, RegistryError> {
        self.store
            .find_by_email(email)?
            .ok_or_else(|| RegistryError::NotFound(email.to_string()))
    }

    /// Apply a partial update; colliding email/wallet fields are all named
    /// in the returned conflict. Refreshes `last_activity_at`.
    pub fn update(&self, id: &str, patch: AdminPatch) -> Result<Administrator, RegistryError> {
        let mut admin = self.store.get(id)?;

        if let Some(ref email) = patch.email {
            validate_email(email)?;
        }
        if let Some(ref first_name) = patch.first_name {
            validate_name("first_name", first_name)?;
        }
        if let Some(ref last_name) = patch.last_name {
            validate_name("last_name", last_name)?;
        }
        let patch_wallet = patch.wallet_address.as_ref().filter(|a| !a.is_empty());
        if let Some(address) = patch_wallet {
            validate_wallet_address(address)?;
        }
        if let Some(ref permissions) = patch.permissions {
            validate_permission_count(
                PermissionSet::from_slice(permissions).len(),
                self.config.max_permissions,
            )?;
        }

        let check_email = patch.email.as_deref().unwrap_or(&admin.email);
        self.check_conflicts(check_email, patch_wallet.map(String::as_str), Some(id))?;

        if let Some(email) = patch.email {
            admin.email = email;
        }
        if let Some(first_name) = patch.first_name {
            admin.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            admin.last_name = last_name;
        }
        if let Some(wallet_address) = patch.wallet_address {
            admin.wallet_address = Some(wallet_address).filter(|a| !a.is_empty());
        }
        if let Some(permissions) = patch.permissions {
            admin.permissions = PermissionSet::from_slice(&permissions);
        }
        if let Some(is_active) = patch.is_active {
            admin.is_active = is_active;
        }

        let now = Utc::now();
        admin.last_activity_at = Some(now);
        admin.updated_at = now;

        self.store.update(&admin).map_err(map_unique_violation)?;
        Ok(admin)
    }

    /// Hard-delete an administrator
    pub fn delete(&self, id: &str) -> Result<(), RegistryError> {
        self.store.delete(id)?;
        info!("Deleted administrator {id}");
        Ok(())
    }

    /// Active administrators whose permission set intersects any of the
    /// requested permissions (OR, not AND)
    pub fn find_by_permissions(
        &self,
        permissions: &[Permission],
    ) -> Result<Vec<Administrator>, RegistryError> {
        Ok(self
            .store
            .list_active()?
            .into_iter()
            .filter(|a| a.permissions.intersects(permissions))
            .collect())
    }

    /// Custody signer entries for every active administrator holding
    /// INITIATE, VOTE, or EXECUTE (reconciler input)
    pub fn signer_entries(&self) -> Result<Vec<SignerEntry>, RegistryError> {
        let qualifying = self.find_by_permissions(&[
            Permission::Initiate,
            Permission::Vote,
            Permission::Execute,
        ])?;
        Ok(qualifying.iter().filter_map(Administrator::signer_entry).collect())
    }

    /// In-process uniqueness pre-check naming every colliding field.
    /// The storage-level UNIQUE constraints remain the race-proof guarantee.
    fn check_conflicts(
        &self,
        email: &str,
        wallet_address: Option<&str>,
        exclude_id: Option<&str>,
    ) -> Result<(), RegistryError> {
        let mut fields = Vec::new();

        if let Some(existing) = self.store.find_by_email(email)? {
            if exclude_id != Some(existing.id.as_str()) {
                fields.push("email");
            }
        }
        if let Some(address) = wallet_address {
            if let Some(existing) = self.store.find_by_wallet(address)? {
                if exclude_id != Some(existing.id.as_str()) {
                    fields.push("wallet_address");
                }
            }
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::Conflict { fields })
        }
    }
}

/// A UNIQUE violation that slipped past the pre-check (concurrent write)
/// still surfaces as a conflict, not a bare database error.
fn map_unique_violation(e: StoreError) -> RegistryError {
    if let StoreError::Database(rusqlite::Error::SqliteFailure(failure, ref message)) = e {
        if failure.code == rusqlite::ErrorCode::ConstraintViolation {
            let message = message.as_deref().unwrap_or("");
            let mut fields = Vec::new();
            if message.contains("email") {
                fields.push("email");
            }
            if message.contains("wallet_address") {
                fields.push("wallet_address");
            }
            if fields.is_empty() {
                fields.push("unknown");
            }
            return RegistryError::Conflict { fields };
        }
    }
    e.into()
}
