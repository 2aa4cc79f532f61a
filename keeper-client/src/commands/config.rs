//! `keeper config` -- view or update the local YAML config file.

use clap::Subcommand;

use crate::config::ClientConfig;
use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the current config.
    Show,
    /// Update one or both keys and write the file back.
    Set {
        #[arg(long)]
        hostport: Option<String>,
        #[arg(long)]
        database: Option<String>,
    },
}

pub fn run(action: ConfigAction, config: &mut ClientConfig) -> Result<(), CliError> {
    match action {
        ConfigAction::Show => {
            println!("hostport: {}", config.hostport);
            println!("database: {}", config.database);
        }
        ConfigAction::Set { hostport, database } => {
            if let Some(hostport) = hostport {
                config.hostport = hostport;
            }
            if let Some(database) = database {
                config.database = database;
            }
            config.save()?;
            println!("saved config to {}", ClientConfig::config_path().display());
        }
    }
    Ok(())
}
