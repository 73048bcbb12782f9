use finch_core::commands;
use finch_core::providers::Provider;
use finch_core::{CoreError, CoreResult, SuccessEnvelope};

use crate::cli::{AccountCommand, Cli, Commands, SyncCommand};
use crate::payload::FileClient;

pub fn dispatch(cli: &Cli) -> CoreResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Sync { command } => match command {
            SyncCommand::Accounts {
                provider,
                input,
                user,
                ..
            } => {
                let provider = resolve_provider(provider)?;
                let client = FileClient::new(provider, input);
                commands::sync::run_accounts(&client, provider, user)
            }
            SyncCommand::Transactions {
                provider,
                input,
                user,
                months,
                end_date,
                ..
            } => {
                let provider = resolve_provider(provider)?;
                let client = FileClient::new(provider, input);
                let end = end_date.as_ref().and_then(|value| value.to_naive_date());
                commands::sync::run_transactions(&client, provider, user, *months, end)
            }
        },
        Commands::Account { command } => match command {
            AccountCommand::List { user, .. } => commands::accounts::run(user),
        },
        Commands::Duplicates { user, from, to, .. } => {
            let from = from.as_ref().and_then(|value| value.to_naive_date());
            let to = to.as_ref().and_then(|value| value.to_naive_date());
            commands::duplicates::run(user, from, to)
        }
    }
}

fn resolve_provider(value: &str) -> CoreResult<Provider> {
    Provider::parse(value).ok_or_else(|| {
        CoreError::invalid_argument(&format!(
            "Unknown provider `{value}`. Expected one of: simplefin, plaid."
        ))
    })
}
