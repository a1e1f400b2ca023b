//! Persistence.
//!
//! Everything the application keeps lives in a flat key-value store behind
//! the [`KvStore`] trait: activity records, session statistics, the banned
//! app list and one journal entry per date. [`Repository`] gives those keys
//! types; [`SqliteStore`] and [`MemoryStore`] are the two backends.

mod config;
mod memory;
pub mod repository;
mod sqlite;

pub use config::{AvailabilityConfig, Config, SessionConfig, StorageConfig};
pub use memory::MemoryStore;
pub use repository::Repository;
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// Logical keys of the store.
pub mod keys {
    /// Ordered list of activity records.
    pub const ACTIVITIES: &str = "task";
    /// Statistics histories, keyed by activity id.
    pub const STATISTICS: &str = "task_statistics";
    /// Banned application identifiers.
    pub const BANNED_APPS: &str = "banned_apps";
}

/// Generic string key-value store.
///
/// Implementations must be safe to share between threads; callers that need
/// read-modify-write atomicity serialize through [`Repository`].
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

impl<T: KvStore + ?Sized> KvStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}

/// Returns `~/.config/focusday[-dev]/` based on FOCUSDAY_ENV.
///
/// Set FOCUSDAY_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSDAY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusday-dev")
    } else {
        base_dir.join("focusday")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
