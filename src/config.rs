//! Runtime configuration for the tether core.
//!
//! Configuration is validated at construction/load time: descending
//! confidence thresholds and nonzero caps are invariants every other
//! component may rely on without re-checking. The gate never validates
//! configuration at evaluation time.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{tlog_debug, Error, Result};

/// Confidence thresholds partitioning [0, 100] into four autonomy bands.
///
/// An action's confidence is classified top-down: at or above
/// `auto_execute` runs unattended, at or above `execute_review` runs but
/// is flagged for post-hoc review, at or above `require_approval` blocks
/// on a human decision, and anything below that is treated as human-led.
/// The thresholds must be descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    pub auto_execute: u8,
    pub execute_review: u8,
    pub require_approval: u8,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            auto_execute: 95,
            execute_review: 85,
            require_approval: 70,
        }
    }
}

/// Top-level configuration, loadable from `~/.tether/tether.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    pub thresholds: ConfidenceThresholds,
    /// Seconds until a pending approval request is considered expired.
    /// Expiry is advisory; see `Harness::sweep_expired_approvals`.
    pub approval_timeout_secs: u64,
    /// Declared per-action deadline, surfaced to executors through
    /// `Harness::config`. The core does not enforce it.
    pub action_timeout_secs: u64,
    pub max_actions_per_minute: u32,
    pub max_tool_calls_per_task: u32,
    pub audit_all_actions: bool,
    pub log_tool_outputs: bool,
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            thresholds: ConfidenceThresholds::default(),
            approval_timeout_secs: 3600,
            action_timeout_secs: 300,
            max_actions_per_minute: 60,
            max_tool_calls_per_task: 100,
            audit_all_actions: true,
            log_tool_outputs: true,
        }
    }
}

impl TetherConfig {
    pub fn tether_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".tether"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::tether_dir()?.join("tether.toml"))
    }

    /// Load from the default config path, falling back to defaults when no
    /// file exists. The result is always validated.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        tlog_debug!("TetherConfig::load path={}", path.display());
        if !path.exists() {
            tlog_debug!("Config file not found, using defaults");
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        Self::from_path(&path)
    }

    /// Load and validate a config file at an explicit path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let dir = Self::tether_dir()?;
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        let path = Self::config_path()?;
        fs::write(&path, toml::to_string_pretty(self)?)?;
        tlog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    /// Reject invariant violations before any gate consults the values.
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if t.auto_execute > 100 || t.execute_review > 100 || t.require_approval > 100 {
            return Err(Error::Validation(
                "confidence thresholds must be within 0..=100".to_string(),
            ));
        }
        if t.auto_execute < t.execute_review || t.execute_review < t.require_approval {
            return Err(Error::Validation(format!(
                "confidence thresholds must be descending: auto_execute={} execute_review={} require_approval={}",
                t.auto_execute, t.execute_review, t.require_approval
            )));
        }
        if self.max_tool_calls_per_task == 0 {
            return Err(Error::Validation(
                "max_tool_calls_per_task must be at least 1".to_string(),
            ));
        }
        if self.max_actions_per_minute == 0 {
            return Err(Error::Validation(
                "max_actions_per_minute must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
