//! Configuration schema for websessions
//!
//! Configuration is stored at `~/.config/websessions/config.toml`

use crate::cache::ExpiryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Session cache location
    pub cache: CacheConfig,

    /// Reaper schedule
    pub cleanup: CleanupConfig,

    /// Eviction policy
    pub expiry: ExpiryConfig,
}

impl Config {
    /// Runtime expiry policy selected by `[expiry]`
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        match self.expiry.policy {
            PolicyKind::Absolute => ExpiryPolicy::Absolute,
            PolicyKind::LastAccess => ExpiryPolicy::LastAccess {
                max_age: chrono::Duration::hours(i64::from(self.expiry.max_age_hours)),
            },
        }
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Session cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one file per session (default: data dir)
    pub directory: Option<PathBuf>,
}

/// Reaper schedule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Hours between sweeps
    pub interval_hours: u32,

    /// Delay before the first sweep after startup
    pub initial_delay_ms: u64,
}

impl CleanupConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_hours) * 3600)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_hours: 24,
            initial_delay_ms: 1000,
        }
    }
}

/// Which staleness signal `sweep` uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// `expires_at` stored in each session
    #[default]
    Absolute,
    /// File access time; requires a mount that records atime
    LastAccess,
}

/// Eviction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpiryConfig {
    pub policy: PolicyKind,

    /// Idle hours before a file is swept (last-access policy only)
    pub max_age_hours: u32,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Absolute,
            max_age_hours: 12,
        }
    }
}
