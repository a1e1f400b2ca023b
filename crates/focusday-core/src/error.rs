//! Core error types for focusday-core.
//!
//! One `thiserror` enum per concern, folded into [`CoreError`] so callers
//! that do not care about the category can use `?` everywhere.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusday-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Usage-log query errors
    #[error("Usage log error: {0}")]
    UsageLog(#[from] UsageLogError),

    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing store
    #[error("Failed to open store at {path}: {message}")]
    Open { path: PathBuf, message: String },

    /// Read or write against the store failed
    #[error("Query failed: {0}")]
    Query(String),

    /// A value could not be encoded for storage
    #[error("Failed to serialize value for key '{key}': {message}")]
    Serialize { key: String, message: String },

    /// The store is locked by another writer
    #[error("Store is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors raised before any state change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One of the four hour/minute fields is empty
    #[error("All hour and minute fields must be filled in")]
    MissingTimeFields,

    /// Activity name is empty
    #[error("Activity name is required")]
    MissingName,

    /// Hour outside 0..24 or not a number
    #[error("Invalid hour '{0}': expected 0-23")]
    InvalidHour(String),

    /// Minute outside 0..60 or not a number
    #[error("Invalid minute '{0}': expected 0-59")]
    InvalidMinute(String),

    /// Start time is not strictly before end time
    #[error("Start time ({start}) must be before end time ({end})")]
    EndBeforeStart { start: String, end: String },

    /// Rating outside 1..=5
    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    /// Out of bounds
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },
}

/// Errors from the device usage-event log.
#[derive(Error, Debug)]
pub enum UsageLogError {
    /// The log could not be reached (permission missing, service down)
    #[error("Usage log unavailable: {0}")]
    Unavailable(String),

    /// The log answered with data that could not be decoded
    #[error("Malformed usage log data: {0}")]
    Malformed(String),

    /// IO errors while reading an exported log
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the session state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Rating attempted before the countdown reached zero
    #[error("Session has not expired yet ({time_left}s left)")]
    NotExpired { time_left: u64 },

    /// Rating attempted while the usage verdict is still being computed
    #[error("Session verdict is still pending")]
    VerdictPending,

    /// The usage verdict was already applied
    #[error("Session verdict was already applied")]
    VerdictAlreadyApplied,

    /// A rating was already recorded for this occurrence
    #[error("Session was already rated")]
    AlreadyRated,

    /// The session already has an activity and a running countdown
    #[error("Session was already started")]
    AlreadyStarted,

    /// No activity has been loaded into the session yet
    #[error("Session has no activity loaded")]
    NotLoaded,

    /// The activity does not occur on the session date
    #[error("Activity '{name}' is not scheduled on {date}")]
    NotScheduled { name: String, date: chrono::NaiveDate },

    /// The activity addressed by the session does not exist
    #[error("Activity not found: {0}")]
    ActivityNotFound(String),

    /// The session was torn down before it finished
    #[error("Session was cancelled")]
    Cancelled,
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::Query(err.to_string())
                }
            }
            _ => StorageError::Query(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
