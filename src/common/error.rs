//! Error types for the API test runner
//!
//! `Error` covers failures that stop the process before or around a run
//! (unreadable workbook, bad config). Failures of individual test cases are
//! data, not errors, and live in [`crate::engine::CaseFailure`].

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the API test runner
#[derive(Error, Debug)]
pub enum Error {
    // === Workbook Errors ===
    #[error("Sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    #[error("Sheet '{sheet}' has no '{column}' column in its header row")]
    MissingColumn { sheet: String, column: String },

    #[error("Invalid workbook: {0}")]
    WorkbookParse(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === HTTP Session Errors ===
    #[error("Failed to build HTTP session: {0}")]
    Session(String),

    // === Notification Errors ===
    #[error("Notification delivery failed: {0}")]
    Notify(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },
}

impl Error {
    /// Create a missing column error
    pub fn missing_column(sheet: &str, column: &str) -> Self {
        Self::MissingColumn {
            sheet: sheet.to_string(),
            column: column.to_string(),
        }
    }

    /// Create an invalid setting error
    pub fn invalid_setting(key: &str, reason: &str) -> Self {
        Self::InvalidSetting {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a file read error for `path`
    pub fn file_read(path: &std::path::Path, error: &io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
