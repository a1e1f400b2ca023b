use serde::{Deserialize, Serialize};

/// A break, in seconds remaining on the countdown.
///
/// Active while `start <= time_left < end`. Because the countdown runs
/// downward, the break begins in wall-clock time when `time_left` drops
/// below `end` and finishes when it drops below `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakWindow {
    pub start: u64,
    pub end: u64,
}

impl BreakWindow {
    pub fn contains(&self, time_left: u64) -> bool {
        self.start <= time_left && time_left < self.end
    }

    pub fn duration_secs(&self) -> u64 {
        self.end - self.start
    }
}

/// Spread `count` breaks of `duration_minutes` evenly over `total_seconds`.
///
/// Break `i` (1-indexed) starts at `floor(total_seconds / (count + 1) * i)`.
/// Overlap between long breaks is not checked.
pub fn compute_breaks(total_seconds: u64, count: u32, duration_minutes: u32) -> Vec<BreakWindow> {
    let slots = u128::from(count) + 1;
    let length = u64::from(duration_minutes) * 60;
    (1..=u128::from(count))
        .map(|i| {
            let start = (u128::from(total_seconds) * i / slots) as u64;
            BreakWindow {
                start,
                end: start + length,
            }
        })
        .collect()
}
