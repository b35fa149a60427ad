//! File-backed auto-accept preferences.
//!
//! # File Format
//!
//! ```json
//! {
//!   "autoAccept": {
//!     "L3RtcC9wcm9qZWN0/ses_abc": true,
//!     "ses_legacy": false
//!   }
//! }
//! ```
//!
//! Older files stored the same map under `autoAcceptEdits`; it is migrated on
//! load and written back under `autoAccept` on the next save.
//!
//! # Defensive Design
//!
//! - Missing or empty file → empty store
//! - Corrupt JSON or a non-object document → empty store, logged
//! - Non-boolean values → skipped, logged
//!
//! Writes go through a temp file in the same directory and an atomic rename.

use std::io::Write;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::Serialize;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{ComposerError, Result};

use super::{accept_key, AutoAcceptMap};

const AUTO_ACCEPT_FIELD: &str = "autoAccept";
const LEGACY_AUTO_ACCEPT_FIELD: &str = "autoAcceptEdits";

#[derive(Serialize)]
struct PreferenceFile<'a> {
    #[serde(rename = "autoAccept")]
    auto_accept: &'a AutoAcceptMap,
}

/// In-memory auto-accept map, optionally backed by a file.
///
/// Create with [`PreferenceStore::load`] to read from disk,
/// or [`PreferenceStore::new_in_memory`] for tests and embedding.
#[derive(Debug, Default)]
pub struct PreferenceStore {
    auto_accept: AutoAcceptMap,
    file_path: Option<PathBuf>,
}

impl PreferenceStore {
    pub fn new_in_memory() -> Self {
        PreferenceStore::default()
    }

    pub fn new(file_path: &Path) -> Self {
        PreferenceStore {
            auto_accept: AutoAcceptMap::new(),
            file_path: Some(file_path.to_path_buf()),
        }
    }

    pub fn from_map(auto_accept: AutoAcceptMap) -> Self {
        PreferenceStore {
            auto_accept,
            file_path: None,
        }
    }

    pub fn load(file_path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(file_path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PreferenceStore::new(file_path))
            }
            Err(source) => {
                return Err(ComposerError::Io {
                    context: "reading preference file".to_string(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            warn!(path = %file_path.display(), "Empty preference file, returning empty store");
            return Ok(PreferenceStore::new(file_path));
        }

        let document = match serde_json::from_str::<Value>(&content) {
            Ok(document) => document,
            Err(err) => {
                warn!(
                    error = %err,
                    path = %file_path.display(),
                    "Failed to parse preference file, returning empty store"
                );
                return Ok(PreferenceStore::new(file_path));
            }
        };

        Ok(PreferenceStore {
            auto_accept: migrate(document),
            file_path: Some(file_path.to_path_buf()),
        })
    }

    pub fn save(&self) -> Result<()> {
        let file_path = self
            .file_path
            .as_ref()
            .ok_or(ComposerError::NoPreferencesPath)?;

        let content = serde_json::to_string_pretty(&PreferenceFile {
            auto_accept: &self.auto_accept,
        })
        .map_err(|source| ComposerError::Json {
            context: "serializing preferences".to_string(),
            source,
        })?;

        let parent_dir = file_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent_dir).map_err(|source| ComposerError::Io {
            context: "creating preference directory".to_string(),
            source,
        })?;

        let mut temp_file =
            NamedTempFile::new_in(parent_dir).map_err(|source| ComposerError::Io {
                context: "creating temp preference file".to_string(),
                source,
            })?;
        temp_file
            .write_all(content.as_bytes())
            .and_then(|_| temp_file.flush())
            .map_err(|source| ComposerError::Io {
                context: "writing temp preference file".to_string(),
                source,
            })?;
        temp_file
            .persist(file_path)
            .map_err(|err| ComposerError::PersistFailed {
                path: file_path.clone(),
                source: err.error,
            })?;

        debug!(path = %file_path.display(), entries = self.auto_accept.len(), "Preferences saved");
        Ok(())
    }

    /// Saves when file-backed; in-memory stores keep changes in memory only.
    pub fn save_if_backed(&self) -> Result<()> {
        if self.file_path.is_none() {
            return Ok(());
        }
        self.save()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn auto_accept(&self) -> &AutoAcceptMap {
        &self.auto_accept
    }

    /// Turns auto-accept on for `session_id` within `directory`.
    ///
    /// The legacy key is dropped so the directory-scoped value is the only one
    /// left for this session.
    pub fn enable(&mut self, session_id: &str, directory: &str) {
        let key = accept_key(session_id, Some(directory));
        if key != session_id {
            self.auto_accept.remove(session_id);
        }
        self.auto_accept.insert(key, true);
    }

    /// Turns auto-accept off for `session_id`, scoped to `directory` when given.
    pub fn disable(&mut self, session_id: &str, directory: Option<&str>) {
        let key = accept_key(session_id, directory);
        if key != session_id {
            self.auto_accept.remove(session_id);
        }
        self.auto_accept.insert(key, false);
    }
}

/// Extracts the auto-accept map from a stored document of any known version.
fn migrate(document: Value) -> AutoAcceptMap {
    let Value::Object(mut data) = document else {
        warn!("Preference file is not a JSON object, returning empty store");
        return AutoAcceptMap::new();
    };

    let current = data
        .remove(AUTO_ACCEPT_FIELD)
        .filter(|value| !is_falsy(value));
    let entries = match current {
        Some(Value::Object(entries)) => entries,
        Some(_) => Map::new(),
        None => match data.remove(LEGACY_AUTO_ACCEPT_FIELD) {
            Some(Value::Object(entries)) => {
                debug!(entries = entries.len(), "Migrating autoAcceptEdits preferences");
                entries
            }
            _ => Map::new(),
        },
    };

    entries
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Bool(flag) => Some((key, flag)),
            other => {
                warn!(key = %key, value = %other, "Skipping non-boolean auto-accept entry");
                None
            }
        })
        .collect()
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(text) => text.is_empty(),
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}
