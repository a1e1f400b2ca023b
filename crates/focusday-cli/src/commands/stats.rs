use clap::Args;
use focusday_core::stats::aggregate;
use focusday_core::storage::Config;

use super::{open_repository, CliResult};

#[derive(Args)]
pub struct StatsArgs {
    #[arg(long)]
    json: bool,
}

pub fn run(args: StatsArgs) -> CliResult {
    let config = Config::load()?;
    let repo = open_repository(&config)?;
    let report = aggregate(&repo.activities(), &repo.statistics());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if report.is_empty() {
        println!("no rated sessions yet");
        return Ok(());
    }

    for stats in &report.activities {
        println!(
            "{:<20} rating {:>3}  passed {:>5}%  streak {}  ({} sessions)",
            stats.name,
            stats.average_rating_label(),
            stats.pass_rate_label(),
            stats.streak,
            stats.sessions
        );
    }
    println!();
    for bucket in &report.hours {
        println!("{:>5}  {:.2}", bucket.label, bucket.value);
    }
    Ok(())
}
