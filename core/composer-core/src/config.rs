//! Configuration loading and path utilities.
//!
//! Handles paths and persistence for:
//! - Composer settings (`~/.composer/config.json`)
//! - Auto-accept preferences (`~/.composer/permission.json`)
//! - Log files (`~/.composer/logs/`)

use chrono::Duration;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::responder::responded::{MAX_RESPONDED, RESPONDED_TTL_SECS};

/// Returns the path to the composer directory (~/.composer).
pub fn get_composer_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".composer"))
}

/// Returns the path to the settings file.
pub fn get_config_path() -> Option<PathBuf> {
    get_composer_dir().map(|d| d.join("config.json"))
}

/// Returns the default path to the auto-accept preference file.
pub fn get_preferences_path() -> Option<PathBuf> {
    get_composer_dir().map(|d| d.join("permission.json"))
}

/// Returns the directory for rolling log files.
pub fn get_log_dir() -> Option<PathBuf> {
    get_composer_dir().map(|d| d.join("logs"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// How long an answered permission ID is remembered.
    #[serde(default = "default_responded_ttl_secs")]
    pub responded_ttl_secs: i64,
    /// Upper bound on remembered permission IDs.
    #[serde(default = "default_responded_max")]
    pub responded_max: usize,
    /// Overrides the preference file location.
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            responded_ttl_secs: default_responded_ttl_secs(),
            responded_max: default_responded_max(),
            preferences_path: None,
        }
    }
}

impl ComposerConfig {
    /// Preference file to use: the configured override, else the default location.
    pub fn resolve_preferences_path(&self) -> Option<PathBuf> {
        self.preferences_path.clone().or_else(get_preferences_path)
    }

    /// How long answered IDs are remembered. Non-positive or out-of-range
    /// values fall back to the default.
    pub fn responded_ttl(&self) -> Duration {
        match Some(self.responded_ttl_secs)
            .filter(|secs| *secs > 0)
            .and_then(Duration::try_seconds)
        {
            Some(ttl) => ttl,
            None => {
                warn!(
                    responded_ttl_secs = self.responded_ttl_secs,
                    "Invalid responded_ttl_secs; using default"
                );
                Duration::seconds(RESPONDED_TTL_SECS)
            }
        }
    }

    /// Cap on remembered answered IDs. Zero falls back to the default.
    pub fn responded_capacity(&self) -> usize {
        if self.responded_max == 0 {
            warn!("responded_max must be at least 1; using default");
            return MAX_RESPONDED;
        }
        self.responded_max
    }
}

fn default_responded_ttl_secs() -> i64 {
    RESPONDED_TTL_SECS
}

fn default_responded_max() -> usize {
    MAX_RESPONDED
}

/// Loads settings from the default location, returning defaults if missing.
pub fn load_composer_config() -> ComposerConfig {
    get_config_path()
        .map(|p| load_composer_config_from(&p))
        .unwrap_or_default()
}

/// Loads settings from `path`. Missing or malformed files yield defaults.
pub fn load_composer_config_from(path: &Path) -> ComposerConfig {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return ComposerConfig::default()
        }
        Err(err) => {
            warn!(error = %err, path = %path.display(), "Failed to read composer config");
            return ComposerConfig::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, path = %path.display(), "Malformed composer config; using defaults");
            ComposerConfig::default()
        }
    }
}
