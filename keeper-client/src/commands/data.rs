//! `keeper data {create|get|list|update|delete}` -- record CRUD.

use std::path::PathBuf;

use clap::Subcommand;
use keeper_actions::{Actions, UpdateOutcome};
use keeper_domain::User;
use keeper_store::SqliteLocalStore;

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum DataAction {
    /// Create a new record. Payload from `--file` or `--value`, exactly one.
    Create {
        name: String,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        value: Option<String>,
    },
    /// Print a record's plaintext.
    Get { name: String },
    /// List every record name known locally.
    List,
    /// Replace a record's payload.
    Update {
        name: String,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        value: Option<String>,
    },
    /// Delete a record.
    Delete { name: String },
}

pub async fn run(
    action: DataAction,
    actions: &Actions<SqliteLocalStore>,
    user: &User,
) -> Result<(), CliError> {
    match action {
        DataAction::Create { name, file, value } => {
            let plaintext = read_payload(file, value)?;
            actions.create_record(user, &name, &plaintext).await?;
            println!("created {name}");
        }
        DataAction::Get { name } => {
            let plaintext = actions.get_record(user, &name).await?;
            println!("{}", String::from_utf8_lossy(&plaintext));
        }
        DataAction::List => {
            for (name, _) in actions.list_records(user).await? {
                println!("{name}");
            }
        }
        DataAction::Update { name, file, value } => {
            let plaintext = read_payload(file, value)?;
            match actions.update_record(user, &name, &plaintext).await? {
                UpdateOutcome::Updated { revision } => {
                    println!("updated {name} (revision {revision})")
                }
                UpdateOutcome::Unchanged => println!("nothing to update"),
            }
        }
        DataAction::Delete { name } => {
            actions.delete_record(user, &name).await?;
            println!("deleted {name}");
        }
    }
    Ok(())
}

fn read_payload(file: Option<PathBuf>, value: Option<String>) -> Result<Vec<u8>, CliError> {
    match (file, value) {
        (Some(path), None) => std::fs::read(&path).map_err(|e| {
            CliError::Operational(format!("read data from file {}, err={e}", path.display()))
        }),
        (None, Some(value)) => Ok(value.into_bytes()),
        (None, None) => Err(CliError::Validation(
            "one of --file or --value is required".to_string(),
        )),
        (Some(_), Some(_)) => Err(CliError::Validation(
            "--file and --value are mutually exclusive".to_string(),
        )),
    }
}

