//! Free-time detection for one day.
//!
//! The window is small and bounded (at most 1440 minutes), so occupancy is
//! tracked in a dense per-minute array and free runs fall out of a single
//! left-to-right sweep. Overlapping occurrences coalesce for free.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::recurrence::TaskOccurrence;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Bounds of the scanned part of the day, in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub start_minute: u32,
    pub end_minute: u32,
}

impl AvailabilityWindow {
    /// Clamps both bounds to the day and keeps `start <= end`.
    pub fn new(start_minute: u32, end_minute: u32) -> Self {
        let end_minute = end_minute.min(MINUTES_PER_DAY);
        Self {
            start_minute: start_minute.min(end_minute),
            end_minute,
        }
    }

    /// 06:00-20:00
    pub fn working_hours() -> Self {
        Self::new(6 * 60, 20 * 60)
    }

    /// 00:00-24:00
    pub fn whole_day() -> Self {
        Self::new(0, MINUTES_PER_DAY)
    }

    pub fn len(&self) -> u32 {
        self.end_minute - self.start_minute
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AvailabilityWindow {
    fn default() -> Self {
        Self::working_hours()
    }
}

/// A maximal run of unoccupied minutes, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeInterval {
    pub start_minute: u32,
    pub end_minute: u32,
}

impl FreeInterval {
    pub fn duration_minutes(&self) -> u32 {
        self.end_minute - self.start_minute
    }
}

impl fmt::Display for FreeInterval {
    /// `"6:00 - 9:00"`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:02} - {}:{:02}",
            self.start_minute / 60,
            self.start_minute % 60,
            self.end_minute / 60,
            self.end_minute % 60
        )
    }
}

/// Free intervals inside `window`, in chronological order.
///
/// Each occurrence occupies `[start, end)`, clipped to the window; an
/// occurrence partly outside the window still blocks the part inside it.
pub fn compute_free_intervals(
    occurrences: &[TaskOccurrence],
    window: AvailabilityWindow,
) -> Vec<FreeInterval> {
    let offset = window.start_minute;
    let mut taken = vec![false; window.len() as usize];

    for occurrence in occurrences {
        let start = occurrence.start_minute_of_day().max(window.start_minute);
        let end = occurrence.end_minute_of_day().min(window.end_minute);
        for minute in start..end {
            taken[(minute - offset) as usize] = true;
        }
    }

    let mut intervals = Vec::new();
    let mut run_start: Option<u32> = None;
    for (i, &occupied) in taken.iter().enumerate() {
        let minute = offset + i as u32;
        match (occupied, run_start) {
            (false, None) => run_start = Some(minute),
            (true, Some(start)) => {
                intervals.push(FreeInterval {
                    start_minute: start,
                    end_minute: minute,
                });
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        intervals.push(FreeInterval {
            start_minute: start,
            end_minute: window.end_minute,
        });
    }
    intervals
}

/// Intervals rendered and joined for sharing: `"6:00 - 9:00, 10:00 - 20:00"`.
pub fn share_text(intervals: &[FreeInterval]) -> String {
    intervals
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
