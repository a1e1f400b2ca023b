//! Focusday core library.
//!
//! Recurring activities are resolved onto calendar days, the gaps between
//! them become free time, and each occurrence can be run as a focus session
//! whose outcome (a rating plus whether a banned app was opened) feeds the
//! statistics.
//!
//! All state lives behind [`storage::KvStore`]. The CLI is a thin layer over
//! this crate.

pub mod activity;
pub mod availability;
pub mod dates;
pub mod error;
pub mod events;
pub mod plan;
pub mod recurrence;
pub mod session;
pub mod stats;
pub mod storage;
pub mod usage;

pub use activity::{Activity, ActivityDraft, ActivityId, Repetition};
pub use availability::{compute_free_intervals, AvailabilityWindow, FreeInterval};
pub use error::{
    ConfigError, CoreError, Result, SessionError, StorageError, UsageLogError, ValidationError,
};
pub use events::SessionEvent;
pub use plan::DayPlan;
pub use recurrence::{resolve, resolve_day, TaskOccurrence};
pub use session::{
    SessionDriver, SessionHandle, SessionMonitor, SessionState, UsageFailurePolicy, Verdict,
};
pub use stats::{aggregate, Rating, StatRecord, StatsReport};
pub use storage::{Config, KvStore, MemoryStore, Repository, SqliteStore};
pub use usage::{BannedApps, JsonUsageLog, MemoryUsageLog, UsageEvent, UsageLog};
