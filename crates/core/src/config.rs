//! Governance configuration with configurable thresholds
//!
//! All values can be overridden via config file; defaults match the
//! documented deployment profile.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the governance core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    // === Quorum ===
    /// Approvals required before a pending transaction becomes approved
    #[serde(default = "default_voting_threshold")]
    pub voting_threshold: u32,

    /// Lower bound for the custody policy threshold
    #[serde(default = "default_min_threshold")]
    pub min_threshold: u32,

    /// Upper bound for the custody policy threshold
    #[serde(default = "default_max_threshold")]
    pub max_threshold: u32,

    // === Permissions ===
    /// Maximum number of capabilities a single administrator may hold
    #[serde(default = "default_max_permissions")]
    pub max_permissions: usize,

    // === Sub-systems ===
    #[serde(default)]
    pub inactivity: InactivityConfig,

    #[serde(default)]
    pub time_delay: TimeDelayConfig,
}

/// Inactivity revocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InactivityConfig {
    /// Whether the periodic cleanup scheduler runs at all
    #[serde(default = "default_inactivity_enabled")]
    pub enabled: bool,

    /// Hours of unused, available work before a capability is revoked
    #[serde(default = "default_timeout_hours")]
    pub timeout_hours: i64,

    /// Minutes between scheduled cleanup runs
    #[serde(default = "default_cleanup_interval_minutes")]
    pub cleanup_interval_minutes: u64,
}

/// Time-lock settings for pushed custody policies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeDelayConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Requested delay before an approved transfer settles
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,

    #[serde(default = "default_min_delay_seconds")]
    pub min_delay_seconds: u64,

    #[serde(default = "default_max_delay_seconds")]
    pub max_delay_seconds: u64,
}

fn default_voting_threshold() -> u32 {
    2
}

fn default_min_threshold() -> u32 {
    1
}

fn default_max_threshold() -> u32 {
    10
}

fn default_max_permissions() -> usize {
    4
}

fn default_inactivity_enabled() -> bool {
    true
}

fn default_timeout_hours() -> i64 {
    48
}

fn default_cleanup_interval_minutes() -> u64 {
    60
}

fn default_delay_seconds() -> u64 {
    300
}

fn default_min_delay_seconds() -> u64 {
    60
}

fn default_max_delay_seconds() -> u64 {
    86_400
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            voting_threshold: default_voting_threshold(),
            min_threshold: default_min_threshold(),
            max_threshold: default_max_threshold(),
            max_permissions: default_max_permissions(),
            inactivity: InactivityConfig::default(),
            time_delay: TimeDelayConfig::default(),
        }
    }
}

impl Default for InactivityConfig {
    fn default() -> Self {
        Self {
            enabled: default_inactivity_enabled(),
            timeout_hours: default_timeout_hours(),
            cleanup_interval_minutes: default_cleanup_interval_minutes(),
        }
    }
}

impl Default for TimeDelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_seconds: default_delay_seconds(),
            min_delay_seconds: default_min_delay_seconds(),
            max_delay_seconds: default_max_delay_seconds(),
        }
    }
}

impl GovernanceConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Custody policy threshold for a signer list of the given size
    ///
    /// `max(min, min(max, min(voting_threshold, signer_count)))`, never
    /// exceeding the signer count.
    pub fn effective_threshold(&self, signer_count: u32) -> u32 {
        self.voting_threshold
            .min(signer_count)
            .min(self.max_threshold)
            .max(self.min_threshold)
            .min(signer_count)
    }

    /// Clamped time-lock value, or None when the feature is disabled
    pub fn effective_delay_seconds(&self) -> Option<u64> {
        if !self.time_delay.enabled {
            return None;
        }
        Some(
            self.time_delay
                .delay_seconds
                .clamp(self.time_delay.min_delay_seconds, self.time_delay.max_delay_seconds),
        )
    }
}

impl InactivityConfig {
    /// Inactivity window as a chrono Duration
    pub fn timeout(&self) -> chrono::Duration {
        chrono::Duration::hours(self.timeout_hours)
    }

    /// Scheduler period as a std Duration
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_minutes * 60)
    }
}
