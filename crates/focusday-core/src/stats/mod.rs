//! Statistics for completed sessions
//!
//! Each rated session appends a [`StatRecord`] to its activity's history.
//! The aggregator turns those histories into per-activity summaries
//! (average rating, pass rate, streak) and an hour-of-day rating profile.

mod aggregate;
mod record;

pub use aggregate::{aggregate, current_streak, ActivityStats, HourBucket, StatsReport};
pub use record::{Rating, StatRecord};
