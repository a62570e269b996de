//! # Custos Approval
//!
//! The transaction approval state machine: propose, vote, execute.
//!
//! Quorum rule: any reject vote moves a pending transaction to REJECTED;
//! approvals reaching `min(voting_threshold, listed admin count)` move it
//! to APPROVED. Execution is a separately-permissioned irreversible step
//! from APPROVED to EXECUTED.

mod error;
mod workflow;

pub use error::ApprovalError;
pub use workflow::{ApprovalWorkflow, VoteOutcome};
