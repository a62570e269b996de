//! # Custos Ledger
//!
//! Owns transaction records and their approval state. Status transitions
//! are atomic conditional writes; a stale concurrent caller observes the
//! real current status instead of silently double-transitioning.

mod store;
mod transaction;

pub use store::{StoreError, TransactionStore};
pub use transaction::{Transaction, TransactionStatus, VoteDecision, VoteRecord};
