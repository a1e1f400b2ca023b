use clap::Subcommand;
use focusday_core::storage::Config;

use super::{open_repository, CliResult};

#[derive(Subcommand)]
pub enum BannedAction {
    /// List banned app identifiers
    List,
    /// Ban an app, e.g. com.instagram.android
    Add { package: String },
    /// Lift a ban
    Remove { package: String },
}

pub fn run(action: BannedAction) -> CliResult {
    let config = Config::load()?;
    let repo = open_repository(&config)?;

    match action {
        BannedAction::List => {
            for package in repo.banned_apps().iter() {
                println!("{package}");
            }
        }
        BannedAction::Add { package } => {
            if repo.ban_app(&package)? {
                println!("banned {package}");
            } else {
                println!("{package} was already banned");
            }
        }
        BannedAction::Remove { package } => {
            if repo.unban_app(&package)? {
                println!("removed {package}");
            } else {
                return Err(format!("{package} is not banned").into());
            }
        }
    }
    Ok(())
}
