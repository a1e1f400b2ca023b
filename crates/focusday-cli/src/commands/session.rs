//! Focus session commands for CLI.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use chrono::Local;
use clap::Subcommand;
use focusday_core::events::SessionEvent;
use focusday_core::session::{format_countdown, SessionDriver, SessionHandle, SessionMonitor};
use focusday_core::stats::Rating;
use focusday_core::storage::Config;
use focusday_core::usage::{BannedApps, JsonUsageLog, MemoryUsageLog, UsageLog};
use focusday_core::Verdict;

use super::{open_repository, CliResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run today's occurrence of the activity at an index
    Run {
        index: usize,
        /// Exported usage-event log (JSON array)
        #[arg(long)]
        usage_log: Option<PathBuf>,
        /// Rating 1-5; asked on stdin when omitted
        #[arg(long)]
        rating: Option<u8>,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: SessionAction) -> CliResult {
    match action {
        SessionAction::Run {
            index,
            usage_log,
            rating,
            json,
        } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_session(index, usage_log, rating, json))
        }
    }
}

async fn run_session(
    index: usize,
    usage_log: Option<PathBuf>,
    rating: Option<u8>,
    json: bool,
) -> CliResult {
    // Reject a bad rating before sitting through the countdown.
    let rating = rating.map(Rating::new).transpose()?;

    let config = Config::load()?;
    let repo = open_repository(&config)?;
    let now = Local::now().naive_local();

    let mut monitor = SessionMonitor::new(now.date()).with_policy(config.session.usage_failure);
    print_event(&monitor.load(&repo, index)?, json)?;
    print_event(&monitor.start(now)?, json)?;

    let banned = repo.banned_apps();
    let tick = config.tick_interval();
    let mut monitor = match usage_log {
        Some(path) => drive(monitor, JsonUsageLog::new(path), banned, tick, json).await?,
        None => {
            let log = MemoryUsageLog::unavailable("no usage log given (--usage-log)");
            drive(monitor, log, banned, tick, json).await?
        }
    };

    let rating = match rating {
        Some(rating) => rating,
        None => prompt_rating()?,
    };
    let event = monitor.rate_and_store(rating, &repo)?;
    print_event(&event, json)?;
    Ok(())
}

async fn drive<L: UsageLog + 'static>(
    monitor: SessionMonitor,
    log: L,
    banned: BannedApps,
    tick: std::time::Duration,
    json: bool,
) -> Result<SessionMonitor, Box<dyn std::error::Error>> {
    let driver = SessionDriver::new(monitor, log, banned).with_tick_interval(tick);
    let mut handle = SessionHandle::spawn(driver);
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => print_event(&event, json)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                handle.cancel();
            }
        }
    }
    Ok(handle.finish().await?)
}

fn print_event(event: &SessionEvent, json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    let mut err = std::io::stderr();
    match event {
        SessionEvent::Loaded { name, .. } => eprintln!("{name}"),
        SessionEvent::Started {
            total_secs, breaks, ..
        } => {
            eprintln!("{} remaining, {} break(s)", format_countdown(*total_secs), breaks.len());
        }
        SessionEvent::Tick { time_left } => {
            write!(err, "\r{:>6}", format_countdown(*time_left))?;
            err.flush()?;
        }
        SessionEvent::BreakStarted { time_left, .. } => {
            eprintln!("\rbreak ({} left)", format_countdown(*time_left));
        }
        SessionEvent::BreakEnded { .. } => eprintln!("\rback to work"),
        SessionEvent::Expired { .. } => eprintln!("\rtime is up"),
        SessionEvent::VerdictReached { verdict, passed, .. } => match verdict {
            Verdict::Passed => eprintln!("no banned app was opened"),
            Verdict::Failed { apps } => eprintln!("banned apps opened: {}", apps.join(", ")),
            Verdict::Unverified { reason } => eprintln!(
                "could not check app usage ({reason}); recorded as {}",
                if *passed { "passed" } else { "failed" }
            ),
        },
        SessionEvent::Rated { record, .. } => {
            println!("{}", serde_json::to_string(record)?);
        }
        SessionEvent::Cancelled { .. } => eprintln!("\rsession cancelled"),
    }
    Ok(())
}

fn prompt_rating() -> Result<Rating, Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    loop {
        eprint!("Rating (1-5): ");
        std::io::stderr().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Err("no rating given".into());
        }
        match line.trim().parse::<u8>().map_err(|e| e.to_string()).and_then(|n| {
            Rating::new(n).map_err(|e| e.to_string())
        }) {
            Ok(rating) => return Ok(rating),
            Err(e) => eprintln!("{e}"),
        }
    }
}
