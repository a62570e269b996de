//! Transaction and vote records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Approval state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Awaiting votes
    Pending,
    /// Quorum reached, awaiting execution
    Approved,
    /// Executed; terminal
    Executed,
    /// Rejected by a vote; terminal
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Approved => "approved",
            TransactionStatus::Executed => "executed",
            TransactionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "approved" => Some(TransactionStatus::Approved),
            "executed" => Some(TransactionStatus::Executed),
            "rejected" => Some(TransactionStatus::Rejected),
            _ => None,
        }
    }

    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Executed | TransactionStatus::Rejected)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An administrator's recorded decision on a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDecision {
    Approve,
    Reject,
}

impl VoteDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDecision::Approve => "approve",
            VoteDecision::Reject => "reject",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approve" => Some(VoteDecision::Approve),
            "reject" => Some(VoteDecision::Reject),
            _ => None,
        }
    }
}

/// A transaction awaiting multi-party approval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: String,

    /// The end-user whose custody account the transaction moves funds from
    pub user_email: String,

    /// Administrators entitled to vote on or execute this transaction
    pub admin_emails: Vec<String>,

    pub status: TransactionStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Open a new pending transaction
    pub fn new(user_email: impl Into<String>, admin_emails: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_email: user_email.into(),
            admin_emails,
            status: TransactionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the given administrator email may act on this transaction
    pub fn lists_admin(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|e| e == email)
    }
}

/// One recorded vote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub transaction_id: String,
    pub admin_id: String,
    pub admin_email: String,
    pub decision: VoteDecision,
    pub voted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction_is_pending() {
        let tx = Transaction::new("user@example.com", vec!["admin@example.com".to_string()]);

        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.lists_admin("admin@example.com"));
        assert!(!tx.lists_admin("stranger@example.com"));
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Approved,
            TransactionStatus::Executed,
            TransactionStatus::Rejected,
        ] {
            assert_eq!(TransactionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TransactionStatus::parse("bogus"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(!TransactionStatus::Approved.is_terminal());
        assert!(TransactionStatus::Executed.is_terminal());
        assert!(TransactionStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_decision_parse() {
        assert_eq!(VoteDecision::parse("approve"), Some(VoteDecision::Approve));
        assert_eq!(VoteDecision::parse("reject"), Some(VoteDecision::Reject));
        assert_eq!(VoteDecision::parse("abstain"), None);
    }
}
