//! Activity management commands for CLI.

use chrono::{Datelike, Utc};
use clap::Subcommand;
use focusday_core::activity::{format_hm, Activity, ActivityDraft, Repetition};
use focusday_core::dates::{long_date, weekday_name};
use focusday_core::storage::Config;

use super::{date_or_today, open_repository, CliResult};

#[derive(Subcommand)]
pub enum ActivityAction {
    /// Create a new activity
    Add {
        /// Activity name
        name: String,
        /// Start time, "H:MM"
        #[arg(long)]
        start: String,
        /// End time, "H:MM"
        #[arg(long)]
        end: String,
        /// one-time, same-weekday, weekdays or everyday
        #[arg(long, default_value = "one-time")]
        repeat: Repetition,
        /// Anchor date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
        /// Number of breaks
        #[arg(long, default_value = "0")]
        breaks: u32,
        /// Minutes per break
        #[arg(long, default_value = "5")]
        break_minutes: u32,
        #[arg(long, default_value = "")]
        details: String,
        /// Checklist step (repeatable)
        #[arg(long = "step")]
        steps: Vec<String>,
        /// Remind this many minutes before the start
        #[arg(long)]
        remind: Option<u32>,
    },
    /// List activities with their index
    List {
        #[arg(long)]
        json: bool,
    },
    /// Edit the activity at an index
    Edit {
        index: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        repeat: Option<Repetition>,
        #[arg(long)]
        breaks: Option<u32>,
        #[arg(long)]
        break_minutes: Option<u32>,
        #[arg(long)]
        details: Option<String>,
    },
    /// Delete the activity at an index, with its statistics
    Delete { index: usize },
}

/// `"9:30"` -> `("9", "30")`; a bare hour means minute zero.
fn split_time(text: &str) -> (String, String) {
    match text.split_once(':') {
        Some((h, m)) => (h.to_string(), m.to_string()),
        None => (text.to_string(), "0".to_string()),
    }
}

fn draft_from(activity: &Activity) -> ActivityDraft {
    ActivityDraft {
        name: activity.name.clone(),
        start_hour: activity.start_hour.to_string(),
        start_minute: activity.start_minute.to_string(),
        end_hour: activity.end_hour.to_string(),
        end_minute: activity.end_minute.to_string(),
        breaks_count: activity.breaks_count,
        breaks_duration: activity.breaks_duration,
        details: activity.details.clone(),
        steps: activity.steps.clone(),
        repetition: activity.repetition,
        day: activity.day.clone(),
        week_day: activity.week_day.clone(),
        notifications: activity.notifications,
        notification_time: activity.notification_time,
    }
}

fn print_row(index: usize, activity: &Activity) {
    let reminder = activity
        .reminder_at(date_or_today(None))
        .map(|at| format!("  (reminder {})", at.format("%-H:%M")))
        .unwrap_or_default();
    println!(
        "{index:>3}  {:<11}  {:<13}  {}{reminder}",
        activity.time_range(),
        activity.repetition.as_str(),
        activity.name
    );
}

pub fn run(action: ActivityAction) -> CliResult {
    let config = Config::load()?;
    let repo = open_repository(&config)?;

    match action {
        ActivityAction::Add {
            name,
            start,
            end,
            repeat,
            date,
            breaks,
            break_minutes,
            details,
            steps,
            remind,
        } => {
            let date = date_or_today(date);
            let (start_hour, start_minute) = split_time(&start);
            let (end_hour, end_minute) = split_time(&end);
            let draft = ActivityDraft {
                name,
                start_hour,
                start_minute,
                end_hour,
                end_minute,
                breaks_count: breaks,
                breaks_duration: break_minutes,
                details,
                steps,
                repetition: repeat,
                day: Some(long_date(date)),
                week_day: Some(weekday_name(date.weekday()).to_string()),
                notifications: remind.is_some(),
                notification_time: remind.unwrap_or(5),
            };
            let activity = draft.validate(Utc::now().timestamp_millis())?;
            let index = repo.add_activity(activity.clone())?;
            println!("Activity created: #{index}");
            println!("{}", serde_json::to_string_pretty(&activity)?);
        }
        ActivityAction::List { json } => {
            let activities = repo.list_activities();
            if json {
                let rows: Vec<_> = activities
                    .iter()
                    .map(|(index, a)| serde_json::json!({ "index": index, "activity": a }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if activities.is_empty() {
                println!("no activities");
            } else {
                for (index, activity) in &activities {
                    print_row(*index, activity);
                }
            }
        }
        ActivityAction::Edit {
            index,
            name,
            start,
            end,
            repeat,
            breaks,
            break_minutes,
            details,
        } => {
            let current = repo.activity_at(index)?;
            let mut draft = draft_from(&current);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(start) = start {
                (draft.start_hour, draft.start_minute) = split_time(&start);
            }
            if let Some(end) = end {
                (draft.end_hour, draft.end_minute) = split_time(&end);
            }
            if let Some(repeat) = repeat {
                draft.repetition = repeat;
            }
            if let Some(breaks) = breaks {
                draft.breaks_count = breaks;
            }
            if let Some(minutes) = break_minutes {
                draft.breaks_duration = minutes;
            }
            if let Some(details) = details {
                draft.details = details;
            }
            let mut edited = draft.validate(current.start_date)?;
            edited.id = current.id;
            let updated = repo.update_activity(index, edited)?;
            println!(
                "Activity #{index} updated: {} {}",
                format_hm(updated.start_hour, updated.start_minute),
                updated.name
            );
        }
        ActivityAction::Delete { index } => {
            repo.delete_activity(index)?;
            println!("Activity #{index} deleted");
        }
    }
    Ok(())
}
