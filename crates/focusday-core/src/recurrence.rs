//! Recurrence resolution: which activities apply to a calendar date.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::activity::{Activity, ActivityId, Repetition};
use crate::dates::{long_date, parse_long_date, weekday_from_name};

/// An activity resolved onto one date. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOccurrence {
    pub activity_id: ActivityId,
    pub name: String,
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
}

impl TaskOccurrence {
    pub fn from_activity(activity: &Activity) -> Self {
        Self {
            activity_id: activity.id,
            name: activity.name.clone(),
            start_hour: activity.start_hour,
            start_minute: activity.start_minute,
            end_hour: activity.end_hour,
            end_minute: activity.end_minute,
        }
    }

    pub fn start_minute_of_day(&self) -> u32 {
        self.start_hour * 60 + self.start_minute
    }

    pub fn end_minute_of_day(&self) -> u32 {
        self.end_hour * 60 + self.end_minute
    }
}

/// Whether `activity` applies on `date`.
///
/// An activity without an anchor `day` only resolves under
/// [`Repetition::Everyday`].
pub fn resolve(activity: &Activity, date: NaiveDate) -> bool {
    let anchor = activity.day.as_deref().filter(|d| !d.trim().is_empty());
    match activity.repetition {
        Repetition::Everyday => true,
        _ if anchor.is_none() => false,
        Repetition::OneTime => anchor == Some(long_date(date).as_str()),
        Repetition::SameWeekday => anchor_weekday(activity) == Some(date.weekday()),
        Repetition::Weekdays => !matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
    }
}

/// Weekday an activity repeats on: the stored `weekDay` name when present,
/// otherwise the weekday of the parsed anchor date.
fn anchor_weekday(activity: &Activity) -> Option<Weekday> {
    activity
        .week_day
        .as_deref()
        .and_then(weekday_from_name)
        .or_else(|| activity.day.as_deref().and_then(parse_long_date).map(|d| d.weekday()))
}

/// Occurrences on `date`, in stored order.
pub fn resolve_day(activities: &[Activity], date: NaiveDate) -> Vec<TaskOccurrence> {
    activities
        .iter()
        .filter(|a| resolve(a, date))
        .map(TaskOccurrence::from_activity)
        .collect()
}

/// Decode raw stored records and resolve them onto `date`.
///
/// Records that fail to decode or violate the time-window invariants are
/// skipped with a warning; the rest of the collection still resolves.
pub fn resolve_records(records: &[serde_json::Value], date: NaiveDate) -> Vec<TaskOccurrence> {
    let activities: Vec<Activity> = records
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| decode_record(index, raw))
        .collect();
    resolve_day(&activities, date)
}

pub(crate) fn decode_record(index: usize, raw: &serde_json::Value) -> Option<Activity> {
    let activity = match serde_json::from_value::<Activity>(raw.clone()) {
        Ok(activity) => activity,
        Err(e) => {
            warn!(index, error = %e, "skipping malformed activity record");
            return None;
        }
    };
    if let Err(e) = activity.validate() {
        warn!(index, error = %e, "skipping invalid activity record");
        return None;
    }
    Some(activity)
}
