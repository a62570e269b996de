//! SQLite storage for transactions and votes

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

use crate::transaction::{Transaction, TransactionStatus, VoteDecision, VoteRecord};

/// Errors from the transaction store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transaction not found: {0}")]
    NotFound(String),

    #[error("Administrator {admin_id} already voted on transaction {transaction_id}")]
    DuplicateVote {
        transaction_id: String,
        admin_id: String,
    },

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// SQLite storage for the transaction ledger
pub struct TransactionStore {
    conn: Mutex<Connection>,
}

impl TransactionStore {
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
            "CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                user_email TEXT NOT NULL,
                admin_emails_json TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transactions_status
             ON transactions(status)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS votes (
                transaction_id TEXT NOT NULL,
                admin_id TEXT NOT NULL,
                admin_email TEXT NOT NULL,
                decision TEXT NOT NULL,
                voted_at TEXT NOT NULL,
                PRIMARY KEY (transaction_id, admin_id)
            )",
            [],
        )?;

        Ok(())
    }

    /// Insert a new transaction
    pub fn insert(&self, tx: &Transaction) -> Result<(), StoreError> {
        let admin_emails_json = serde_json::to_string(&tx.admin_emails)?;
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO transactions (id, user_email, admin_emails_json, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                tx.id,
                tx.user_email,
                admin_emails_json,
                tx.status.as_str(),
                tx.created_at.to_rfc3339(),
                tx.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Get a transaction by id
    pub fn get(&self, id: &str) -> Result<Transaction, StoreError> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, user_email, admin_emails_json, status, created_at, updated_at
                 FROM transactions WHERE id = ?1",
                params![id],
                row_to_tx,
            )
            .optional()?;

        match row {
            Some(row) => row.into_transaction(),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    /// Atomically move a transaction from `from` to `to`.
    ///
    /// Returns true when this call performed the transition; false means
    /// the transaction was no longer in `from` (or does not exist) and the
    /// caller should re-read to see the real status.
    pub fn transition(
        &self,
        id: &str,
        from: TransactionStatus,
        to: TransactionStatus,
    ) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE transactions SET status = ?3, updated_at = ?4
             WHERE id = ?1 AND status = ?2",
            params![id, from.as_str(), to.as_str(), Utc::now().to_rfc3339()],
        )?;
        Ok(rows == 1)
    }

    /// Record a vote; one vote per administrator per transaction
    pub fn record_vote(&self, vote: &VoteRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO votes (transaction_id, admin_id, admin_email, decision, voted_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                vote.transaction_id,
                vote.admin_id,
                vote.admin_email,
                vote.decision.as_str(),
                vote.voted_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateVote {
                    transaction_id: vote.transaction_id.clone(),
                    admin_id: vote.admin_id.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All votes recorded for a transaction
    pub fn votes_for(&self, transaction_id: &str) -> Result<Vec<VoteRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT transaction_id, admin_id, admin_email, decision, voted_at
             FROM votes WHERE transaction_id = ?1 ORDER BY voted_at",
        )?;

        let rows = stmt.query_map(params![transaction_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut votes = Vec::new();
        for row in rows {
            let (transaction_id, admin_id, admin_email, decision, voted_at) = row?;
            votes.push(VoteRecord {
                transaction_id,
                admin_id,
                admin_email,
                decision: VoteDecision::parse(&decision)
                    .ok_or_else(|| StoreError::Corrupt(format!("bad decision {decision:?}")))?,
                voted_at: parse_date(&voted_at)?,
            });
        }
        Ok(votes)
    }

    /// Number of approve votes recorded for a transaction
    pub fn count_approvals(&self, transaction_id: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM votes WHERE transaction_id = ?1 AND decision = 'approve'",
            params![transaction_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// All transactions in a given status
    pub fn list_by_status(&self, status: TransactionStatus) -> Result<Vec<Transaction>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_email, admin_emails_json, status, created_at, updated_at
             FROM transactions WHERE status = ?1 ORDER BY created_at",
        )?;

        let rows = stmt.query_map(params![status.as_str()], row_to_tx)?;
        let mut txs = Vec::new();
        for row in rows {
            txs.push(row?.into_transaction()?);
        }
        Ok(txs)
    }

    /// Whether at least one transaction in `status`, created at or before
    /// `cutoff` and still sitting there, lists the given administrator
    /// email.
    ///
    /// This is the "actionable work outlived the inactivity window
    /// unacted" check used by the revocation engine; work younger than the
    /// window never counts against an administrator.
    pub fn has_stale_actionable(
        &self,
        admin_email: &str,
        status: TransactionStatus,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT admin_emails_json FROM transactions
             WHERE status = ?1 AND created_at <= ?2",
        )?;

        let rows = stmt.query_map(params![status.as_str(), cutoff.to_rfc3339()], |row| {
            row.get::<_, String>(0)
        })?;

        for row in rows {
            let emails: Vec<String> = serde_json::from_str(&row?)?;
            if emails.iter().any(|e| e == admin_email) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

struct TxRow {
    id: String,
    user_email: String,
    admin_emails_json: String,
    status: String,
    created_at: String,
    updated_at: String,
}

fn row_to_tx(row: &Row<'_>) -> rusqlite::Result<TxRow> {
    Ok(TxRow {
        id: row.get(0)?,
        user_email: row.get(1)?,
        admin_emails_json: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl TxRow {
    fn into_transaction(self) -> Result<Transaction, StoreError> {
        Ok(Transaction {
            id: self.id,
            user_email: self.user_email,
            admin_emails: serde_json::from_str(&self.admin_emails_json)?,
            status: TransactionStatus::parse(&self.status)
                .ok_or_else(|| StoreError::Corrupt(format!("bad status {:?}", self.status)))?,
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
