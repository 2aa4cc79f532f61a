//! `keeper secret {create|get|delete}` -- key/value secret CRUD.

use clap::Subcommand;
use keeper_actions::Actions;
use keeper_domain::User;
use keeper_store::SqliteLocalStore;

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum SecretAction {
    /// Create a secret.
    Create {
        name: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        value: String,
    },
    /// Print a secret's key/value.
    Get { name: String },
    /// Delete a secret.
    Delete { name: String },
}

pub async fn run(
    action: SecretAction,
    actions: &Actions<SqliteLocalStore>,
    user: &User,
) -> Result<(), CliError> {
    match action {
        SecretAction::Create { name, key, value } => {
            actions.create_secret(user, &name, &key, &value).await?;
            println!("created {name}");
        }
        SecretAction::Get { name } => {
            let secret = actions.get_secret(user, &name).await?;
            println!("{}={}", secret.key, secret.value);
        }
        SecretAction::Delete { name } => {
            actions.delete_secret(user, &name).await?;
            println!("deleted {name}");
        }
    }
    Ok(())
}
