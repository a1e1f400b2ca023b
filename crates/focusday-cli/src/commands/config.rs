use clap::Subcommand;
use focusday_core::storage::Config;

use super::CliResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Get a config value
    Get {
        /// Config key (e.g. "availability.start_hour", "session.usage_failure")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Write the default configuration file if none exists
    Init,
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("ok");
        }
        ConfigAction::Init => {
            let path = Config::path()?;
            if path.exists() {
                println!("{} already exists", path.display());
            } else {
                Config::default().save_to(&path)?;
                println!("wrote {}", path.display());
            }
        }
    }
    Ok(())
}
