//! # Custos Cleanup
//!
//! The inactivity revocation engine: administrators who had actionable
//! work available and did not act on it within the configured window lose
//! the corresponding capability, and the custody policy of every known
//! account is reconciled afterwards.
//!
//! The engine runs once at service start, then on a fixed interval, and on
//! demand. Per-administrator and per-account failures are collected into
//! the run report; they never abort the remaining batch.

mod engine;
mod report;
mod service;

pub use engine::{CleanupError, InactivityEngine};
pub use report::{CleanupReport, CleanupStatus};
pub use service::CleanupService;
