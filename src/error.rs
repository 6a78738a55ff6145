//! Error types for the change tracker.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=annotations db, 3=not_found, 4=validation, etc.)
//! - Retryability flags
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers
//!
//! An entity that no longer resolves in the analysis database is never an
//! error: reconciliation reads that as "deleted". Only collaborator failures
//! (annotation storage, export, serialization) end up here.

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::SyncError;

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Annotation database (exit 2)
    DatabaseError,

    // Not Found (exit 3)
    SnapshotNotFound,
    EventsNotFound,

    // Validation (exit 4)
    InvalidNotification,

    // Export (exit 6)
    ExportError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::DatabaseError => "DATABASE_ERROR",
            Self::SnapshotNotFound => "SNAPSHOT_NOT_FOUND",
            Self::EventsNotFound => "EVENTS_NOT_FOUND",
            Self::InvalidNotification => "INVALID_NOTIFICATION",
            Self::ExportError => "EXPORT_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::DatabaseError => 2,
            Self::SnapshotNotFound | Self::EventsNotFound => 3,
            Self::InvalidNotification => 4,
            Self::ExportError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether retrying the same call can succeed.
    ///
    /// A failed save keeps every pending change, so export and I/O failures
    /// are worth retrying once the cause is fixed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExportError | Self::IoError | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in tracker operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Snapshot not found: {}", path.display())]
    SnapshotNotFound { path: PathBuf },

    #[error("Notification log not found: {}", path.display())]
    EventsNotFound { path: PathBuf },

    #[error("Invalid notification at line {line}: {message}")]
    InvalidNotification { line: usize, message: String },

    #[error("Annotation database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Export error: {0}")]
    Sync(#[from] SyncError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::SnapshotNotFound { .. } => ErrorCode::SnapshotNotFound,
            Self::EventsNotFound { .. } => ErrorCode::EventsNotFound,
            Self::InvalidNotification { .. } => ErrorCode::InvalidNotification,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Sync(_) => ErrorCode::ExportError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::SnapshotNotFound { path } => Some(format!(
                "No database snapshot at {}. Export one from the host or pass the right path.",
                path.display()
            )),
            Self::EventsNotFound { path } => Some(format!(
                "No notification log at {}. Expected one JSON object per line.",
                path.display()
            )),
            Self::InvalidNotification { .. } => Some(
                "Each line needs a \"kind\" field, e.g. {\"kind\":\"undefine\",\"ea\":4096}"
                    .to_string(),
            ),
            Self::Sync(_) => Some(
                "Pending changes were kept. Fix the cause and run the save again.".to_string(),
            ),
            Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
