use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusday", version, about = "Recurring activities, free time and focus sessions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Activity management
    Activity {
        #[command(subcommand)]
        action: commands::activity::ActivityAction,
    },
    /// One day's activities and free time
    Day(commands::day::DayArgs),
    /// The week containing a date
    Week(commands::day::WeekArgs),
    /// Focus sessions
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Ratings and pass rates per activity
    Stats(commands::stats::StatsArgs),
    /// Daily journal
    Journal {
        #[command(subcommand)]
        action: commands::journal::JournalAction,
    },
    /// Apps that fail a session when opened
    Banned {
        #[command(subcommand)]
        action: commands::banned::BannedAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Delete all activities and statistics
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Activity { action } => commands::activity::run(action),
        Commands::Day(args) => commands::day::run_day(args),
        Commands::Week(args) => commands::day::run_week(args),
        Commands::Session { action } => commands::session::run(action),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Journal { action } => commands::journal::run(action),
        Commands::Banned { action } => commands::banned::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Reset { yes } => commands::reset(yes),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
