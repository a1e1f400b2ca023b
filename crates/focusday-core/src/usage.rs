//! Device usage-event log and the banned-app check.
//!
//! The log itself lives outside the application (the OS usage-stats
//! service); [`UsageLog`] is the seam. A session asks it once, at expiry,
//! for every event inside the occurrence window.

use std::collections::BTreeSet;
use std::future::Future;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::UsageLogError;

/// Event type code for an app coming to the foreground.
pub const APP_OPEN_EVENT: i32 = 0;

/// One entry of the usage-event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEvent {
    #[serde(alias = "packageIdentifier")]
    pub package_name: String,
    pub event_type: i32,
    /// Epoch milliseconds.
    #[serde(alias = "timeStamp")]
    pub timestamp: i64,
}

impl UsageEvent {
    pub fn is_app_open(&self) -> bool {
        self.event_type == APP_OPEN_EVENT
    }
}

/// Query interface over the device usage-event log.
pub trait UsageLog: Send + Sync {
    /// All events with `start_ms <= timestamp <= end_ms`.
    fn query_events(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> impl Future<Output = Result<Vec<UsageEvent>, UsageLogError>> + Send;
}

/// Application identifiers whose use fails a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BannedApps(BTreeSet<String>);

impl BannedApps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, package: &str) -> bool {
        self.0.contains(package)
    }

    /// Returns `false` if the package was already banned.
    pub fn insert(&mut self, package: impl Into<String>) -> bool {
        self.0.insert(package.into())
    }

    pub fn remove(&mut self, package: &str) -> bool {
        self.0.remove(package)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for BannedApps {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Distinct banned packages that were opened, sorted.
pub fn find_banned_opens(events: &[UsageEvent], banned: &BannedApps) -> Vec<String> {
    events
        .iter()
        .filter(|e| e.is_app_open() && banned.contains(&e.package_name))
        .map(|e| e.package_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn in_range(event: &UsageEvent, start_ms: i64, end_ms: i64) -> bool {
    (start_ms..=end_ms).contains(&event.timestamp)
}

/// In-memory log, for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct MemoryUsageLog {
    events: Vec<UsageEvent>,
    failure: Option<String>,
}

impl MemoryUsageLog {
    pub fn new(events: Vec<UsageEvent>) -> Self {
        Self {
            events,
            failure: None,
        }
    }

    /// A log whose every query fails with `message`.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            events: Vec::new(),
            failure: Some(message.into()),
        }
    }

    pub fn push(&mut self, event: UsageEvent) {
        self.events.push(event);
    }
}

impl UsageLog for MemoryUsageLog {
    async fn query_events(&self, start_ms: i64, end_ms: i64) -> Result<Vec<UsageEvent>, UsageLogError> {
        if let Some(message) = &self.failure {
            return Err(UsageLogError::Unavailable(message.clone()));
        }
        Ok(self
            .events
            .iter()
            .filter(|e| in_range(e, start_ms, end_ms))
            .cloned()
            .collect())
    }
}

/// Log exported to a JSON file: an array of [`UsageEvent`] objects.
///
/// The file is read on every query so a fresh export is picked up.
#[derive(Debug, Clone)]
pub struct JsonUsageLog {
    path: PathBuf,
}

impl JsonUsageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UsageLog for JsonUsageLog {
    async fn query_events(&self, start_ms: i64, end_ms: i64) -> Result<Vec<UsageEvent>, UsageLogError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let events: Vec<UsageEvent> =
            serde_json::from_str(&text).map_err(|e| UsageLogError::Malformed(e.to_string()))?;
        Ok(events
            .into_iter()
            .filter(|e| in_range(e, start_ms, end_ms))
            .collect())
    }
}
