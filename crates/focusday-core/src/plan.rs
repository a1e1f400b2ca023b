//! One day's schedule: what runs and what is free.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::activity::Activity;
use crate::availability::{compute_free_intervals, share_text, AvailabilityWindow, FreeInterval};
use crate::dates::long_date;
use crate::recurrence::{resolve_day, TaskOccurrence};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    /// `"19 octombrie 2026"`
    pub label: String,
    pub window: AvailabilityWindow,
    /// In stored activity order.
    pub occurrences: Vec<TaskOccurrence>,
    pub free: Vec<FreeInterval>,
}

impl DayPlan {
    pub fn build(activities: &[Activity], date: NaiveDate, window: AvailabilityWindow) -> Self {
        let occurrences = resolve_day(activities, date);
        let free = compute_free_intervals(&occurrences, window);
        Self {
            date,
            label: long_date(date),
            window,
            occurrences,
            free,
        }
    }

    /// Occurrences sorted by start time, for display.
    pub fn agenda(&self) -> Vec<&TaskOccurrence> {
        let mut sorted: Vec<_> = self.occurrences.iter().collect();
        sorted.sort_by_key(|o| o.start_minute_of_day());
        sorted
    }

    pub fn free_minutes(&self) -> u32 {
        self.free.iter().map(FreeInterval::duration_minutes).sum()
    }

    /// Free intervals joined by `", "`.
    pub fn share_text(&self) -> String {
        share_text(&self.free)
    }
}
