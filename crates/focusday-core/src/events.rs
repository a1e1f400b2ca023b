use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::ActivityId;
use crate::session::{BreakWindow, Verdict};
use crate::stats::StatRecord;

/// Every session state change produces an Event.
/// The CLI prints them; a GUI would render them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Activity fetched; the countdown has not started.
    Loaded {
        activity_id: ActivityId,
        name: String,
    },
    Started {
        activity_id: ActivityId,
        name: String,
        total_secs: u64,
        breaks: Vec<BreakWindow>,
        at: DateTime<Utc>,
    },
    /// Countdown progress without a state change.
    Tick {
        time_left: u64,
    },
    BreakStarted {
        index: usize,
        time_left: u64,
        at: DateTime<Utc>,
    },
    BreakEnded {
        index: usize,
        time_left: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero; the usage log is queried for this window.
    Expired {
        window_start_ms: i64,
        window_end_ms: i64,
        at: DateTime<Utc>,
    },
    VerdictReached {
        verdict: Verdict,
        passed: bool,
        at: DateTime<Utc>,
    },
    Rated {
        activity_id: ActivityId,
        record: StatRecord,
        at: DateTime<Utc>,
    },
    /// Session torn down before it finished.
    Cancelled {
        time_left: u64,
        at: DateTime<Utc>,
    },
}
