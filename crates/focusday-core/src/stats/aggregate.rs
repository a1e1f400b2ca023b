use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::record::StatRecord;
use crate::activity::{Activity, ActivityId};

/// Summary of one activity's rated sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityStats {
    pub activity_id: ActivityId,
    pub name: String,
    /// Mean rating, rounded to one decimal.
    pub average_rating: f64,
    /// Percentage of passed sessions, rounded to one decimal.
    pub pass_rate: f64,
    /// Consecutive passed sessions ending at the most recent one.
    pub streak: u32,
    pub sessions: usize,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl ActivityStats {
    /// `"4.0"`
    pub fn average_rating_label(&self) -> String {
        format!("{:.1}", self.average_rating)
    }

    /// `"100.0"`
    pub fn pass_rate_label(&self) -> String {
        format!("{:.1}", self.pass_rate)
    }
}

/// Mean activity rating for one hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourBucket {
    /// Hour of day (0-23)
    pub hour: u32,
    /// `"9:00"`
    pub label: String,
    /// Mean of the covering activities' average ratings, two decimals.
    pub value: f64,
}

/// Complete statistics report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    /// One entry per activity with at least one record, in activity order.
    pub activities: Vec<ActivityStats>,
    /// Hours covered by at least one rated activity, ascending.
    pub hours: Vec<HourBucket>,
}

impl StatsReport {
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

/// Count of trailing passed records; zero when the newest record failed.
pub fn current_streak(records: &[StatRecord]) -> u32 {
    records.iter().rev().take_while(|r| r.passed).count() as u32
}

/// Build per-activity summaries and the hour profile.
///
/// Activities without records are left out entirely. An hour bucket
/// averages the (rounded) average ratings of every rated activity whose
/// `start_hour..=end_hour` covers it, not the raw session ratings.
pub fn aggregate(
    activities: &[Activity],
    records: &HashMap<ActivityId, Vec<StatRecord>>,
) -> StatsReport {
    let summaries: Vec<ActivityStats> = activities
        .iter()
        .filter_map(|activity| {
            let history = records.get(&activity.id).filter(|h| !h.is_empty())?;
            let total = history.len();
            let rating_sum: u32 = history.iter().map(|r| u32::from(r.rating.stars())).sum();
            let passed = history.iter().filter(|r| r.passed).count();
            Some(ActivityStats {
                activity_id: activity.id,
                name: activity.name.clone(),
                average_rating: round_to(f64::from(rating_sum) / total as f64, 1),
                pass_rate: round_to(passed as f64 / total as f64 * 100.0, 1),
                streak: current_streak(history),
                sessions: total,
                start_hour: activity.start_hour,
                end_hour: activity.end_hour,
            })
        })
        .collect();

    let mut by_hour: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for summary in &summaries {
        for hour in summary.start_hour..=summary.end_hour.min(23) {
            by_hour.entry(hour).or_default().push(summary.average_rating);
        }
    }
    let hours = by_hour
        .into_iter()
        .map(|(hour, ratings)| HourBucket {
            hour,
            label: format!("{hour}:00"),
            value: round_to(ratings.iter().sum::<f64>() / ratings.len() as f64, 2),
        })
        .collect();

    StatsReport {
        activities: summaries,
        hours,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
