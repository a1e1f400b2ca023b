use std::io::Read;

use chrono::NaiveDate;
use clap::Subcommand;
use focusday_core::dates::long_date;
use focusday_core::storage::Config;

use super::{date_or_today, open_repository, CliResult};

#[derive(Subcommand)]
pub enum JournalAction {
    /// Print a day's entry
    Show {
        /// Date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Replace a day's entry
    Write {
        /// Entry text; read from stdin when omitted
        text: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: JournalAction) -> CliResult {
    let config = Config::load()?;
    let repo = open_repository(&config)?;

    match action {
        JournalAction::Show { date } => {
            let date = date_or_today(date);
            let entry = repo.journal_entry(date);
            if entry.is_empty() {
                eprintln!("no entry for {}", long_date(date));
            } else {
                println!("{entry}");
            }
        }
        JournalAction::Write { text, date } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let date = date_or_today(date);
            repo.save_journal_entry(date, text.trim_end())?;
            println!("saved entry for {}", long_date(date));
        }
    }
    Ok(())
}
