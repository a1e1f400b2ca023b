pub mod activity;
pub mod banned;
pub mod config;
pub mod day;
pub mod journal;
pub mod session;
pub mod stats;

use chrono::{Local, NaiveDate};
use focusday_core::storage::{Config, Repository, SqliteStore};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the configured database.
pub fn open_repository(config: &Config) -> Result<Repository<SqliteStore>, Box<dyn std::error::Error>> {
    let path = config.database_path()?;
    tracing::debug!(path = %path.display(), "opening database");
    Ok(Repository::new(SqliteStore::open(&path)?))
}

/// `date` or today.
pub fn date_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

pub fn reset(yes: bool) -> CliResult {
    if !yes {
        return Err("this deletes every activity and statistic; pass --yes to confirm".into());
    }
    let config = Config::load()?;
    open_repository(&config)?.reset()?;
    println!("storage reset");
    Ok(())
}
