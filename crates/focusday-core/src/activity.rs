//! Activity definitions.
//!
//! An [`Activity`] is what the user schedules: a daily time window, a
//! recurrence policy, optional breaks and a checklist. Records are stored as
//! camelCase JSON; numeric fields are decoded leniently because earlier
//! editors wrote them as text (`"9"`, `"2 pauze"`).

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Stable identifier for an activity. Statistics are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(Uuid);

impl ActivityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok().map(Self)
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Recurrence policy. Exactly one per activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Repetition {
    /// Only on the anchor date.
    #[default]
    #[serde(rename = "one-time")]
    OneTime,
    /// Every week on the anchor's weekday.
    #[serde(rename = "same-weekday")]
    SameWeekday,
    /// Monday through Friday.
    #[serde(rename = "weekdays")]
    Weekdays,
    /// Every day.
    #[serde(rename = "everyday")]
    Everyday,
}

impl Repetition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Repetition::OneTime => "one-time",
            Repetition::SameWeekday => "same-weekday",
            Repetition::Weekdays => "weekdays",
            Repetition::Everyday => "everyday",
        }
    }
}

impl std::str::FromStr for Repetition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one-time" => Ok(Repetition::OneTime),
            "same-weekday" => Ok(Repetition::SameWeekday),
            "weekdays" => Ok(Repetition::Weekdays),
            "everyday" => Ok(Repetition::Everyday),
            other => Err(format!(
                "unknown repetition '{other}' (expected one-time, same-weekday, weekdays, everyday)"
            )),
        }
    }
}

/// A user-defined schedulable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default)]
    pub id: ActivityId,
    pub name: String,
    #[serde(deserialize_with = "lenient::u32")]
    pub start_hour: u32,
    #[serde(deserialize_with = "lenient::u32")]
    pub start_minute: u32,
    #[serde(deserialize_with = "lenient::u32")]
    pub end_hour: u32,
    #[serde(deserialize_with = "lenient::u32")]
    pub end_minute: u32,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub breaks_count: u32,
    /// Minutes per break.
    #[serde(default = "default_break_minutes", deserialize_with = "lenient::u32")]
    pub breaks_duration: u32,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub repetition: Repetition,
    /// Anchor date in [`crate::dates::long_date`] format.
    #[serde(default)]
    pub day: Option<String>,
    /// Weekday name, set when the activity was created from the week view.
    #[serde(default)]
    pub week_day: Option<String>,
    /// Creation time, epoch milliseconds.
    #[serde(default)]
    pub start_date: i64,
    #[serde(default)]
    pub notifications: bool,
    /// Minutes before start at which a reminder fires.
    #[serde(default = "default_notification_minutes", deserialize_with = "lenient::u32")]
    pub notification_time: u32,
}

fn default_break_minutes() -> u32 {
    5
}

fn default_notification_minutes() -> u32 {
    5
}

impl Activity {
    pub fn start_minute_of_day(&self) -> u32 {
        self.start_hour * 60 + self.start_minute
    }

    pub fn end_minute_of_day(&self) -> u32 {
        self.end_hour * 60 + self.end_minute
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end_minute_of_day()
            .saturating_sub(self.start_minute_of_day())
    }

    /// Check the time-window invariants of a loaded record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        for hour in [self.start_hour, self.end_hour] {
            if hour >= 24 {
                return Err(ValidationError::InvalidHour(hour.to_string()));
            }
        }
        for minute in [self.start_minute, self.end_minute] {
            if minute >= 60 {
                return Err(ValidationError::InvalidMinute(minute.to_string()));
            }
        }
        if self.start_minute_of_day() >= self.end_minute_of_day() {
            return Err(ValidationError::EndBeforeStart {
                start: format_hm(self.start_hour, self.start_minute),
                end: format_hm(self.end_hour, self.end_minute),
            });
        }
        Ok(())
    }

    /// Wall-clock start and end of this activity on `date`.
    pub fn window_on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let at = |h: u32, m: u32| {
            NaiveTime::from_hms_opt(h, m, 0)
                .map(|t| date.and_time(t))
                .unwrap_or_else(|| date.and_time(NaiveTime::MIN) + Duration::minutes(i64::from(h * 60 + m)))
        };
        (
            at(self.start_hour, self.start_minute),
            at(self.end_hour, self.end_minute),
        )
    }

    /// When the reminder for the occurrence on `date` fires, if enabled.
    pub fn reminder_at(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        if !self.notifications {
            return None;
        }
        let (start, _) = self.window_on(date);
        Some(start - Duration::minutes(i64::from(self.notification_time)))
    }

    /// `"9:00-10:30"`
    pub fn time_range(&self) -> String {
        format!(
            "{}-{}",
            format_hm(self.start_hour, self.start_minute),
            format_hm(self.end_hour, self.end_minute)
        )
    }
}

/// Hours unpadded, minutes zero-padded: `"9:05"`.
pub fn format_hm(hour: u32, minute: u32) -> String {
    format!("{hour}:{minute:02}")
}

/// Form input from the activity editor, still as text.
#[derive(Debug, Clone, Default)]
pub struct ActivityDraft {
    pub name: String,
    pub start_hour: String,
    pub start_minute: String,
    pub end_hour: String,
    pub end_minute: String,
    pub breaks_count: u32,
    pub breaks_duration: u32,
    pub details: String,
    pub steps: Vec<String>,
    pub repetition: Repetition,
    pub day: Option<String>,
    pub week_day: Option<String>,
    pub notifications: bool,
    pub notification_time: u32,
}

impl ActivityDraft {
    /// Validate the form and build an activity.
    ///
    /// Checks run in the editor's order: every time field filled, name
    /// present, hour/minute ranges, then start strictly before end. Nothing
    /// is written when this fails.
    pub fn validate(self, created_at_ms: i64) -> Result<Activity, ValidationError> {
        let fields = [
            &self.start_hour,
            &self.start_minute,
            &self.end_hour,
            &self.end_minute,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ValidationError::MissingTimeFields);
        }
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }

        let start_hour = parse_hour(&self.start_hour)?;
        let start_minute = parse_minute(&self.start_minute)?;
        let end_hour = parse_hour(&self.end_hour)?;
        let end_minute = parse_minute(&self.end_minute)?;
        if start_hour * 60 + start_minute >= end_hour * 60 + end_minute {
            return Err(ValidationError::EndBeforeStart {
                start: format_hm(start_hour, start_minute),
                end: format_hm(end_hour, end_minute),
            });
        }

        let steps = self
            .steps
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Activity {
            id: ActivityId::new(),
            name,
            start_hour,
            start_minute,
            end_hour,
            end_minute,
            breaks_count: self.breaks_count,
            breaks_duration: self.breaks_duration,
            details: self.details,
            steps,
            repetition: self.repetition,
            day: self.day,
            week_day: self.week_day,
            start_date: created_at_ms,
            notifications: self.notifications,
            notification_time: self.notification_time,
        })
    }
}

fn parse_hour(text: &str) -> Result<u32, ValidationError> {
    match text.trim().parse::<u32>() {
        Ok(h) if h < 24 => Ok(h),
        _ => Err(ValidationError::InvalidHour(text.trim().to_string())),
    }
}

fn parse_minute(text: &str) -> Result<u32, ValidationError> {
    match text.trim().parse::<u32>() {
        Ok(m) if m < 60 => Ok(m),
        _ => Err(ValidationError::InvalidMinute(text.trim().to_string())),
    }
}

/// Deserializers for numbers that may have been stored as text.
mod lenient {
    use serde::de::{self, Deserializer};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Float(f64),
        Text(String),
    }

    /// Accepts `9`, `9.0`, `"9"` and `"2 pauze"` (leading digits).
    pub fn u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => u32::try_from(n).map_err(de::Error::custom),
            Raw::Float(f) if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) => {
                Ok(f as u32)
            }
            Raw::Float(f) => Err(de::Error::custom(format!("expected whole number, got {f}"))),
            Raw::Text(s) => {
                let digits: String = s
                    .trim()
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                digits
                    .parse()
                    .map_err(|_| de::Error::custom(format!("expected number, got '{s}'")))
            }
        }
    }
}
