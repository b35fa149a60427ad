//! Error types for composer-core operations.
//!
//! Tree and policy resolution never fail; only the edges that touch disk or
//! the transport return these.

use std::path::PathBuf;

/// All errors that can occur in composer-core operations.
#[derive(Debug, thiserror::Error)]
pub enum ComposerError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("No file path set for in-memory preference store")]
    NoPreferencesPath,

    #[error("Invalid encoded directory: {encoded}")]
    InvalidDirectory { encoded: String },

    // ─────────────────────────────────────────────────────────────────────
    // Snapshot Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Invalid snapshot: {code}: {message}")]
    InvalidSnapshot { code: String, message: String },

    // ─────────────────────────────────────────────────────────────────────
    // Transport Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Permission response failed: {permission_id}: {details}")]
    RespondFailed {
        permission_id: String,
        details: String,
    },

    #[error("Listing pending permissions failed: {directory}: {details}")]
    ListFailed { directory: String, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to persist file: {path}: {source}")]
    PersistFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<composer_protocol::ErrorInfo> for ComposerError {
    fn from(info: composer_protocol::ErrorInfo) -> Self {
        ComposerError::InvalidSnapshot {
            code: info.code,
            message: info.message,
        }
    }
}

/// Convenience type alias for Results using ComposerError.
pub type Result<T> = std::result::Result<T, ComposerError>;
