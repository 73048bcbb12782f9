use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoDate(pub String);

impl IsoDate {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, "%Y-%m-%d").ok()
    }
}

pub fn parse_iso_date(value: &str) -> Result<IsoDate, String> {
    if value.len() != 10 {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return Err("date must use YYYY-MM-DD format".to_string());
        }
    }

    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err("date must use valid calendar values".to_string());
    }

    Ok(IsoDate(value.to_string()))
}

pub fn parse_provider(value: &str) -> Result<String, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "simplefin" | "plaid" => Ok(value.trim().to_ascii_lowercase()),
        _ => Err("provider must be one of: simplefin, plaid".to_string()),
    }
}

/// Extended help shown after `finch sync transactions --help`.
pub const SYNC_TRANSACTIONS_AFTER_HELP: &str = "\
How sync works:
  Finch does not call provider APIs directly from this command.
  You export a raw provider payload (SimpleFIN accounts response, or a
  Plaid accounts+transactions export), then point sync at that file.

  SimpleFIN payload: the JSON body of `GET /accounts`, with each account
  carrying an embedded `org` and a `transactions` array.
  Plaid payload: one JSON object with `institution`, `accounts`, and
  `transactions` keys, as returned by the Plaid export tooling.

Window rules:
  --months N moves the window start back N calendar months from the end
  date, clamping to the last day of shorter months. The end date
  defaults to today; override it with --end-date YYYY-MM-DD.
  Example: --months 6 --end-date 2024-12-31 fetches 2024-06-30 through
  2024-12-31 inclusive.

Partial failures:
  One malformed record never aborts a sync. Valid records commit, and
  the report lists every failed record with its reason. Re-running the
  same sync is safe: transactions are write-once by external id, and
  your category and tag edits are preserved.
";

#[derive(Debug, Parser)]
#[command(
    name = "finch",
    version,
    about = "personal finance data aggregator",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sync provider data into your local entity store
    #[command(arg_required_else_help = true)]
    Sync {
        #[command(subcommand)]
        command: SyncCommand,
    },
    /// Account-level orientation commands
    #[command(arg_required_else_help = true)]
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
    /// Report duplicate transaction candidates across accounts
    Duplicates {
        /// User whose transactions to scan
        #[arg(long)]
        user: String,
        /// Start date filter (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        from: Option<IsoDate>,
        /// End date filter (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        to: Option<IsoDate>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum SyncCommand {
    /// Sync institutions, accounts, and balance snapshots
    Accounts {
        /// Data provider: simplefin or plaid
        #[arg(long, value_parser = parse_provider)]
        provider: String,
        /// Path to a raw provider payload file
        #[arg(long)]
        input: String,
        /// User to attribute synced records to
        #[arg(long)]
        user: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Sync transactions over a calendar-month window
    #[command(after_long_help = SYNC_TRANSACTIONS_AFTER_HELP)]
    Transactions {
        /// Data provider: simplefin or plaid
        #[arg(long, value_parser = parse_provider)]
        provider: String,
        /// Path to a raw provider payload file
        #[arg(long)]
        input: String,
        /// User to attribute synced records to
        #[arg(long)]
        user: String,
        /// Number of calendar months to look back
        #[arg(long, default_value_t = 6)]
        months: u32,
        /// Window end date (YYYY-MM-DD); defaults to today
        #[arg(long, value_parser = parse_iso_date)]
        end_date: Option<IsoDate>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum AccountCommand {
    /// Show synced accounts with institutions and latest balances
    List {
        /// User whose accounts to list
        #[arg(long)]
        user: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::{AccountCommand, Commands, SyncCommand, parse_from};

    #[test]
    fn parse_command_paths() {
        let cases: [Vec<&str>; 8] = [
            vec![
                "finch",
                "sync",
                "accounts",
                "--provider",
                "simplefin",
                "--input",
                "./payload.json",
                "--user",
                "u1",
            ],
            vec![
                "finch",
                "sync",
                "accounts",
                "--provider",
                "plaid",
                "--input",
                "./payload.json",
                "--user",
                "u1",
                "--json",
            ],
            vec![
                "finch",
                "sync",
                "transactions",
                "--provider",
                "simplefin",
                "--input",
                "./payload.json",
                "--user",
                "u1",
            ],
            vec![
                "finch",
                "sync",
                "transactions",
                "--provider",
                "plaid",
                "--input",
                "./payload.json",
                "--user",
                "u1",
                "--months",
                "3",
                "--end-date",
                "2024-12-31",
                "--json",
            ],
            vec!["finch", "duplicates", "--user", "u1"],
            vec![
                "finch",
                "duplicates",
                "--user",
                "u1",
                "--from",
                "2024-01-01",
                "--to",
                "2024-12-31",
                "--json",
            ],
            vec!["finch", "account", "list", "--user", "u1"],
            vec!["finch", "account", "list", "--user", "u1", "--json"],
        ];

        for case in cases {
            let parsed = parse_from(case.clone());
            assert!(parsed.is_ok(), "failed to parse: {case:?}");
        }
    }

    #[test]
    fn parse_account_list_subcommand() {
        let parsed = parse_from(["finch", "account", "list", "--user", "u1", "--json"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            assert!(matches!(
                cli.command,
                Commands::Account {
                    command: AccountCommand::List { json: true, .. }
                }
            ));
        }
    }

    #[test]
    fn sync_transactions_defaults_to_six_months() {
        let parsed = parse_from([
            "finch",
            "sync",
            "transactions",
            "--provider",
            "simplefin",
            "--input",
            "p.json",
            "--user",
            "u1",
        ]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            assert!(matches!(
                cli.command,
                Commands::Sync {
                    command: SyncCommand::Transactions {
                        months: 6,
                        end_date: None,
                        ..
                    }
                }
            ));
        }
    }

    #[test]
    fn invalid_provider_is_rejected() {
        let parsed = parse_from([
            "finch",
            "sync",
            "accounts",
            "--provider",
            "mint",
            "--input",
            "p.json",
            "--user",
            "u1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn invalid_date_is_rejected() {
        let parsed = parse_from(["finch", "duplicates", "--user", "u1", "--from", "2024-99-01"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn bare_sync_shows_help() {
        let parsed = parse_from(["finch", "sync"]);
        assert!(parsed.is_err());
        if let Err(err) = parsed {
            assert_eq!(
                err.kind(),
                ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            );
        }
    }

    #[test]
    fn bare_account_shows_help() {
        let parsed = parse_from(["finch", "account"]);
        assert!(parsed.is_err());
        if let Err(err) = parsed {
            assert_eq!(
                err.kind(),
                ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            );
        }
    }

    #[test]
    fn help_command_is_rejected() {
        let parsed = parse_from(["finch", "help"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn subcommand_help_uses_clap_display_help() {
        let parsed = parse_from(["finch", "sync", "transactions", "--help"]);
        assert!(parsed.is_err());
        if let Err(err) = parsed {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
