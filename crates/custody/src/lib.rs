//! # Custos Custody
//!
//! Interface to the external custody backend that holds the authoritative
//! signer/threshold policy for every end-user account, plus the reconciler
//! that recomputes and pushes that policy after administrator-set changes.
//!
//! The wire protocol is not modeled beyond the fields the core sends and
//! interprets: signer list, threshold, optional time-lock.

mod backend;
mod directory;
mod error;
mod mock;
mod reconciler;
mod types;

pub use backend::CustodyBackend;
pub use directory::{AccountDirectory, MockDirectory};
pub use error::CustodyError;
pub use mock::MockCustodyBackend;
pub use reconciler::PolicyReconciler;
pub use types::{AccountPolicy, AppliedPolicy, CustodyAccount, SignerEntry, SignerPermission};
