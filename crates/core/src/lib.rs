//! # Custos Core
//!
//! Shared domain primitives for the Custos governance system:
//! - The five-capability permission model
//! - Governance configuration (quorum thresholds, inactivity windows, time delay)
//! - Input validation for administrator fields and key material

mod config;
mod permission;
mod validate;

pub use config::{GovernanceConfig, InactivityConfig, TimeDelayConfig};
pub use permission::{Permission, PermissionSet};
pub use validate::{
    validate_email, validate_name, validate_permission_count, validate_secret_key,
    validate_wallet_address, ValidationError,
};
