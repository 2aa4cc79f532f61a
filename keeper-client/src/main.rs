//! Keeper CLI (§6 "CLI surface", specified as a collaborator). Subcommand
//! tree: `config`, `register`, `data {create|get|list|update|delete}`,
//! `wallet {create|delete|list}`, `secret {create|get|delete}`. Exit code 0
//! on success, 1 on validation failure, non-zero on operational failure
//! with the message on stderr -- never a stack trace.

mod commands;
mod config;
mod error;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use keeper_actions::Actions;
use keeper_store::SqliteLocalStore;
use keeper_transport::Client;

use config::ClientConfig;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "keeper", about = "Personal secret-keeper CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// View or update the local config file.
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Register (or re-confirm) a user and set it as locally active.
    Register {
        #[arg(long)]
        login: String,
        #[arg(long)]
        password: String,
    },
    /// Record CRUD.
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
    /// Payment card CRUD.
    Wallet {
        #[command(subcommand)]
        action: commands::wallet::WalletAction,
    },
    /// Key/value secret CRUD.
    Secret {
        #[command(subcommand)]
        action: commands::secret::SecretAction,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Config { action } => {
            let mut config = ClientConfig::load_or_default()?;
            commands::config::run(action, &mut config)
        }
        Command::Register { login, password } => {
            let config = ClientConfig::load_or_default()?;
            let actions = build_actions(&config)?;
            let user = actions.register(&login, &password).await?;
            println!("registered {} (token {})", user.login, user.token);
            Ok(())
        }
        Command::Data { action } => {
            let (actions, user) = active_session().await?;
            commands::data::run(action, &actions, &user).await
        }
        Command::Wallet { action } => {
            let (actions, user) = active_session().await?;
            commands::wallet::run(action, &actions, &user).await
        }
        Command::Secret { action } => {
            let (actions, user) = active_session().await?;
            commands::secret::run(action, &actions, &user).await
        }
    }
}

/// Loads the config, opens the local store, and resolves the active user --
/// the setup every subcommand except `config`/`register` needs.
async fn active_session() -> Result<(Actions<SqliteLocalStore>, keeper_domain::User), CliError> {
    let config = ClientConfig::load_or_default()?;
    let actions = build_actions(&config)?;
    let user = actions.active_user().await?;
    Ok((actions, user))
}

fn build_actions(config: &ClientConfig) -> Result<Actions<SqliteLocalStore>, CliError> {
    let dir = ClientConfig::config_dir();
    std::fs::create_dir_all(&dir)
        .map_err(|e| CliError::Operational(format!("create config dir {}, err={e}", dir.display())))?;

    let local = SqliteLocalStore::open(config.database_path())
        .map_err(|e| CliError::Operational(format!("open local database, err={e}")))?;
    let transport = Client::new(config.hostport.clone());

    Ok(Actions::new(Arc::new(local), Arc::new(transport)))
}
