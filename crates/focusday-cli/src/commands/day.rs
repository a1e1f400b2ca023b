//! Day and week views.

use chrono::NaiveDate;
use clap::Args;
use focusday_core::availability::AvailabilityWindow;
use focusday_core::dates::{short_date, week_days, week_label};
use focusday_core::plan::DayPlan;
use focusday_core::recurrence::resolve_day;
use focusday_core::storage::Config;

use super::{date_or_today, open_repository, CliResult};

#[derive(Args)]
pub struct DayArgs {
    /// Date, YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Look for free time over the whole day
    #[arg(long)]
    whole_day: bool,
    /// Print only the free intervals, comma separated
    #[arg(long)]
    share: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct WeekArgs {
    /// Any date in the week, YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<NaiveDate>,
}

pub fn run_day(args: DayArgs) -> CliResult {
    let config = Config::load()?;
    let repo = open_repository(&config)?;
    let window = if args.whole_day {
        AvailabilityWindow::whole_day()
    } else {
        config.availability_window()
    };
    let plan = DayPlan::build(&repo.activities(), date_or_today(args.date), window);

    if args.share {
        println!("{}", plan.share_text());
        return Ok(());
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("{}", plan.label);
    if plan.occurrences.is_empty() {
        println!("  no activities");
    }
    for occurrence in plan.agenda() {
        println!(
            "  {}:{:02}-{}:{:02}  {}",
            occurrence.start_hour,
            occurrence.start_minute,
            occurrence.end_hour,
            occurrence.end_minute,
            occurrence.name
        );
    }
    println!("free: {}", plan.share_text());
    Ok(())
}

pub fn run_week(args: WeekArgs) -> CliResult {
    let config = Config::load()?;
    let repo = open_repository(&config)?;
    let activities = repo.activities();
    let date = date_or_today(args.date);

    println!("{}", week_label(date));
    for (name, day) in week_days(date) {
        let mut occurrences = resolve_day(&activities, day);
        occurrences.sort_by_key(|o| o.start_minute_of_day());
        println!("{name} {}", short_date(day));
        for occurrence in occurrences {
            println!(
                "  {}:{:02}-{}:{:02}  {}",
                occurrence.start_hour,
                occurrence.start_minute,
                occurrence.end_hour,
                occurrence.end_minute,
                occurrence.name
            );
        }
    }
    Ok(())
}
