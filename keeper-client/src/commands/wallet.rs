//! `keeper wallet {create|delete|list}` -- payment card CRUD.

use clap::Subcommand;
use keeper_actions::Actions;
use keeper_domain::{BankCardPlaintext, User};
use keeper_store::SqliteLocalStore;

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum WalletAction {
    /// Validate and create a card. Expiry as `MM/YY`, owner as "FIRST LAST".
    Create {
        number: String,
        #[arg(long)]
        expiry: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        cvv: String,
    },
    /// Delete a card by number.
    Delete { number: String },
    /// List every card known locally.
    List,
}

pub async fn run(
    action: WalletAction,
    actions: &Actions<SqliteLocalStore>,
    user: &User,
) -> Result<(), CliError> {
    match action {
        WalletAction::Create {
            number,
            expiry,
            owner,
            cvv,
        } => {
            let card = BankCardPlaintext::parse(&number, &expiry, &owner, &cvv)?;
            actions.create_card(user, &card).await?;
            println!("created card {}", card.number);
        }
        WalletAction::Delete { number } => {
            actions.delete_card(user, &number).await?;
            println!("deleted card {number}");
        }
        WalletAction::List => {
            for card in actions.list_cards(user).await? {
                println!("{}\t{}\t{}", card.number, card.owner, card.expiry);
            }
        }
    }
    Ok(())
}
