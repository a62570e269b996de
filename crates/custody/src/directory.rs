//! Account directory trait - enumerates end-user custody accounts
//!
//! User records themselves live in an external system; the reconciliation
//! fan-out only needs to know which accounts carry a wallet address.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::error::CustodyError;
use crate::types::CustodyAccount;

/// Source of the per-account reconciliation fan-out
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// All end-user accounts currently known to have a wallet address
    async fn custody_accounts(&self) -> Result<Vec<CustodyAccount>, CustodyError>;
}

/// In-memory directory for tests and local runs
pub struct MockDirectory {
    accounts: RwLock<Vec<CustodyAccount>>,
    failing: RwLock<bool>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(Vec::new()),
            failing: RwLock::new(false),
        }
    }

    pub fn add_account(&self, account: CustodyAccount) {
        self.accounts.write().unwrap().push(account);
    }

    /// Make every subsequent listing fail (for error-path tests)
    pub fn set_failing(&self, failing: bool) {
        *self.failing.write().unwrap() = failing;
    }

    pub fn account_count(&self) -> usize {
        self.accounts.read().unwrap().len()
    }
}

impl Default for MockDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountDirectory for MockDirectory {
    async fn custody_accounts(&self) -> Result<Vec<CustodyAccount>, CustodyError> {
        if *self.failing.read().unwrap() {
            return Err(CustodyError::Directory("directory unavailable".to_string()));
        }
        Ok(self
            .accounts
            .read()
            .unwrap()
            .iter()
            .filter(|a| !a.wallet_address.is_empty())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_directory_lists_accounts() {
        let directory = MockDirectory::new();
        directory.add_account(CustodyAccount::new("alice@example.com", "addr-1"));
        directory.add_account(CustodyAccount::new("bob@example.com", "addr-2"));

        let accounts = directory.custody_accounts().await.unwrap();
        assert_eq!(accounts.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_directory_skips_empty_addresses() {
        let directory = MockDirectory::new();
        directory.add_account(CustodyAccount::new("alice@example.com", "addr-1"));
        directory.add_account(CustodyAccount::new("carol@example.com", ""));

        let accounts = directory.custody_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].user_email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_mock_directory_failure_injection() {
        let directory = MockDirectory::new();
        directory.set_failing(true);

        let result = directory.custody_accounts().await;
        assert!(matches!(result, Err(CustodyError::Directory(_))));
    }
}
