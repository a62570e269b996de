//! SQLite storage for administrator records
//!
//! Email and wallet-address uniqueness is enforced here with UNIQUE
//! columns; the registry's in-process conflict check only exists to name
//! the colliding fields before the write.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

use custos_core::PermissionSet;

use crate::activity::ActivityKind;
use crate::admin::Administrator;

/// Errors from the administrator store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Administrator not found: {0}")]
    NotFound(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// SQLite storage for administrators
pub struct AdminStore {
    conn: Mutex<Connection>,
}

const ADMIN_COLUMNS: &str = "id, email, first_name, last_name, wallet_address, public_key, \
     secret_key, permissions_json, is_active, last_activity_at, \
     last_vote_activity_at, last_execute_activity_at, created_at, updated_at";

impl AdminStore {
    /// Open (or create) a store at the given database path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS administrators (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                wallet_address TEXT UNIQUE,
                public_key TEXT,
                secret_key TEXT,
                permissions_json TEXT NOT NULL,
                is_active INTEGER NOT NULL,
                last_activity_at TEXT,
                last_vote_activity_at TEXT,
                last_execute_activity_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_administrators_active
             ON administrators(is_active)",
            [],
        )?;

        Ok(())
    }

    /// Insert a new administrator
    pub fn insert(&self, admin: &Administrator) -> Result<(), StoreError> {
        let permissions_json = serde_json::to_string(&admin.permissions)?;
        let conn = self.conn.lock().unwrap();

        conn.execute(
            &format!("INSERT INTO administrators ({ADMIN_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"),
            params![
                admin.id,
                admin.email,
                admin.first_name,
                admin.last_name,
                admin.wallet_address,
                admin.public_key,
                admin.secret_key,
                permissions_json,
                admin.is_active,
                admin.last_activity_at.map(|t| t.to_rfc3339()),
                admin.last_vote_activity_at.map(|t| t.to_rfc3339()),
                admin.last_execute_activity_at.map(|t| t.to_rfc3339()),
                admin.created_at.to_rfc3339(),
                admin.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Get an administrator by id
    pub fn get(&self, id: &str) -> Result<Administrator, StoreError> {
        self.find(id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Look up an administrator by id, returning None when absent
    pub fn find(&self, id: &str) -> Result<Option<Administrator>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!("SELECT {ADMIN_COLUMNS} FROM administrators WHERE id = ?1"),
                params![id],
                row_to_admin,
            )
            .optional()?;
        row.map(AdminRow::into_admin).transpose()
    }

    /// Look up an administrator by email
    pub fn find_by_email(&self, email: &str) -> Result<Option<Administrator>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!("SELECT {ADMIN_COLUMNS} FROM administrators WHERE email = ?1"),
                params![email],
                row_to_admin,
            )
            .optional()?;
        row.map(AdminRow::into_admin).transpose()
    }

    /// Look up an administrator by wallet address
    pub fn find_by_wallet(&self, address: &str) -> Result<Option<Administrator>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!("SELECT {ADMIN_COLUMNS} FROM administrators WHERE wallet_address = ?1"),
                params![address],
                row_to_admin,
            )
            .optional()?;
        row.map(AdminRow::into_admin).transpose()
    }

    /// Rewrite an existing administrator row
    pub fn update(&self, admin: &Administrator) -> Result<(), StoreError> {
        let permissions_json = serde_json::to_string(&admin.permissions)?;
        let conn = self.conn.lock().unwrap();

        let rows = conn.execute(
            "UPDATE administrators SET
                email = ?2, first_name = ?3, last_name = ?4, wallet_address = ?5,
                public_key = ?6, secret_key = ?7, permissions_json = ?8,
                is_active = ?9, last_activity_at = ?10, last_vote_activity_at = ?11,
                last_execute_activity_at = ?12, updated_at = ?13
             WHERE id = ?1",
            params![
                admin.id,
                admin.email,
                admin.first_name,
                admin.last_name,
                admin.wallet_address,
                admin.public_key,
                admin.secret_key,
                permissions_json,
                admin.is_active,
                admin.last_activity_at.map(|t| t.to_rfc3339()),
                admin.last_vote_activity_at.map(|t| t.to_rfc3339()),
                admin.last_execute_activity_at.map(|t| t.to_rfc3339()),
                admin.updated_at.to_rfc3339(),
            ],
        )?;

        if rows == 0 {
            return Err(StoreError::NotFound(admin.id.clone()));
        }

        Ok(())
    }

    /// Hard-delete an administrator
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute("DELETE FROM administrators WHERE id = ?1", params![id])?;

        if rows == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        Ok(())
    }

    /// All administrators, any state
    pub fn list_all(&self) -> Result<Vec<Administrator>, StoreError> {
        self.list_where("1 = 1")
    }

    /// Active administrators only
    pub fn list_active(&self) -> Result<Vec<Administrator>, StoreError> {
        self.list_where("is_active = 1")
    }

    fn list_where(&self, filter: &str) -> Result<Vec<Administrator>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ADMIN_COLUMNS} FROM administrators WHERE {filter} ORDER BY created_at"
        ))?;

        let rows = stmt.query_map([], row_to_admin)?;
        let mut admins = Vec::new();
        for row in rows {
            admins.push(row?.into_admin()?);
        }
        Ok(admins)
    }

    /// Record an activity timestamp; the kind-specific column and the
    /// generic one are both written.
    pub fn touch(&self, id: &str, kind: ActivityKind, at: DateTime<Utc>) -> Result<(), StoreError> {
        let column = match kind {
            ActivityKind::Generic => None,
            ActivityKind::Vote => Some("last_vote_activity_at"),
            ActivityKind::Execute => Some("last_execute_activity_at"),
        };

        let at_text = at.to_rfc3339();
        let conn = self.conn.lock().unwrap();
        let rows = match column {
            Some(column) => conn.execute(
                &format!(
                    "UPDATE administrators SET last_activity_at = ?2, {column} = ?2 WHERE id = ?1"
                ),
                params![id, at_text],
            )?,
            None => conn.execute(
                "UPDATE administrators SET last_activity_at = ?2 WHERE id = ?1",
                params![id, at_text],
            )?,
        };

        if rows == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        Ok(())
    }
}

/// Intermediate row shape; defers JSON/date parsing out of the rusqlite
/// row callback so parse failures surface as store errors, not SQL errors.
struct AdminRow {
    id: String,
    email: String,
    first_name: String,
    last_name: String,
    wallet_address: Option<String>,
    public_key: Option<String>,
    secret_key: Option<String>,
    permissions_json: String,
    is_active: bool,
    last_activity_at: Option<String>,
    last_vote_activity_at: Option<String>,
    last_execute_activity_at: Option<String>,
    created_at: String,
    updated_at: String,
}

fn row_to_admin(row: &Row<'_>) -> rusqlite::Result<AdminRow> {
    Ok(AdminRow {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        wallet_address: row.get(4)?,
        public_key: row.get(5)?,
        secret_key: row.get(6)?,
        permissions_json: row.get(7)?,
        is_active: row.get(8)?,
        last_activity_at: row.get(9)?,
        last_vote_activity_at: row.get(10)?,
        last_execute_activity_at: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

impl AdminRow {
    fn into_admin(self) -> Result<Administrator, StoreError> {
        let permissions: PermissionSet = serde_json::from_str(&self.permissions_json)?;

        Ok(Administrator {
            id: self.id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            wallet_address: self.wallet_address,
            public_key: self.public_key,
            secret_key: self.secret_key,
            permissions,
            is_active: self.is_active,
            last_activity_at: parse_optional_date(self.last_activity_at)?,
            last_vote_activity_at: parse_optional_date(self.last_vote_activity_at)?,
            last_execute_activity_at: parse_optional_date(self.last_execute_activity_at)?,
            created_at: parse_date(&self.created_at)?,
            updated_at: parse_date(&self.updated_at)?,
        })
    }
}

fn parse_date(text: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {text:?}: {e}")))
}

fn parse_optional_date(text: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
    text.map(|t| parse_date(&t)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use custos_core::{Permission, PermissionSet};

    fn sample_admin(id: &str, email: &str) -> Administrator {
        let now = Utc::now();
        Administrator {
            id: id.to_string(),
            email: email.to_string(),
            first_name: "Alice".to_string(),
            last_name: "Nguyen".to_string(),
            wallet_address: None,
            public_key: None,
            secret_key: None,
            permissions: PermissionSet::from_slice(&[Permission::Vote]),
            is_active: true,
            last_activity_at: None,
            last_vote_activity_at: None,
            last_execute_activity_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = AdminStore::in_memory().unwrap();
        let admin = sample_admin("a1", "alice@example.com");

        store.insert(&admin).unwrap();
        let loaded = store.get("a1").unwrap();

        assert_eq!(loaded.email, "alice@example.com");
        assert!(loaded.permissions.contains(Permission::Vote));
        assert!(loaded.is_active);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = AdminStore::in_memory().unwrap();
        assert!(matches!(store.get("nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_unique_email_enforced_by_storage() {
        let store = AdminStore::in_memory().unwrap();
        store.insert(&sample_admin("a1", "alice@example.com")).unwrap();

        let duplicate = sample_admin("a2", "alice@example.com");
        assert!(matches!(
            store.insert(&duplicate),
            Err(StoreError::Database(_))
        ));
    }

    #[test]
    fn test_unique_wallet_enforced_by_storage() {
        let store = AdminStore::in_memory().unwrap();

        let mut first = sample_admin("a1", "alice@example.com");
        first.wallet_address = Some("addr-1".to_string());
        store.insert(&first).unwrap();

        let mut second = sample_admin("a2", "bob@example.com");
        second.wallet_address = Some("addr-1".to_string());
        assert!(matches!(store.insert(&second), Err(StoreError::Database(_))));

        // absent wallets never collide
        let third = sample_admin("a3", "carol@example.com");
        store.insert(&third).unwrap();
        let fourth = sample_admin("a4", "dave@example.com");
        store.insert(&fourth).unwrap();
    }

    #[test]
    fn test_update_roundtrip() {
        let store = AdminStore::in_memory().unwrap();
        let mut admin = sample_admin("a1", "alice@example.com");
        store.insert(&admin).unwrap();

        admin.permissions = PermissionSet::from_slice(&[Permission::Execute]);
        admin.is_active = false;
        store.update(&admin).unwrap();

        let loaded = store.get("a1").unwrap();
        assert!(!loaded.is_active);
        assert!(loaded.permissions.contains(Permission::Execute));
        assert!(!loaded.permissions.contains(Permission::Vote));
    }

    #[test]
    fn test_delete() {
        let store = AdminStore::in_memory().unwrap();
        store.insert(&sample_admin("a1", "alice@example.com")).unwrap();

        store.delete("a1").unwrap();
        assert!(matches!(store.get("a1"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete("a1"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_list_active_excludes_inactive() {
        let store = AdminStore::in_memory().unwrap();
        store.insert(&sample_admin("a1", "alice@example.com")).unwrap();

        let mut inactive = sample_admin("a2", "bob@example.com");
        inactive.is_active = false;
        store.insert(&inactive).unwrap();

        assert_eq!(store.list_all().unwrap().len(), 2);
        let active = store.list_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "a1");
    }

    #[test]
    fn test_touch_updates_kind_and_generic() {
        let store = AdminStore::in_memory().unwrap();
        store.insert(&sample_admin("a1", "alice@example.com")).unwrap();

        let at = Utc::now();
        store.touch("a1", ActivityKind::Vote, at).unwrap();

        let loaded = store.get("a1").unwrap();
        assert!(loaded.last_vote_activity_at.is_some());
        assert!(loaded.last_activity_at.is_some());
        assert!(loaded.last_execute_activity_at.is_none());
    }

    #[test]
    fn test_touch_missing_admin() {
        let store = AdminStore::in_memory().unwrap();
        let result = store.touch("ghost", ActivityKind::Generic, Utc::now());
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admins.db");

        {
            let store = AdminStore::new(&path).unwrap();
            store.insert(&sample_admin("a1", "alice@example.com")).unwrap();
        }

        let store = AdminStore::new(&path).unwrap();
        assert_eq!(store.list_all().unwrap().len(), 1);
    }
}
