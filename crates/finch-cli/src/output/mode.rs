use crate::cli::{AccountCommand, Commands, SyncCommand};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    let json = match command {
        Commands::Sync { command } => match command {
            SyncCommand::Accounts { json, .. } | SyncCommand::Transactions { json, .. } => *json,
        },
        Commands::Account {
            command: AccountCommand::List { json, .. },
        } => *json,
        Commands::Duplicates { json, .. } => *json,
    };

    if json { OutputMode::Json } else { OutputMode::Text }
}

#[cfg(test)]
mod tests {
    use super::{OutputMode, mode_for_command};
    use crate::cli::parse_from;

    #[test]
    fn mode_uses_json_when_flag_is_set() {
        let parsed = parse_from(["finch", "duplicates", "--user", "u1", "--json"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            assert_eq!(mode_for_command(&cli.command), OutputMode::Json);
        }

        let sync = parse_from([
            "finch",
            "sync",
            "accounts",
            "--provider",
            "simplefin",
            "--input",
            "p.json",
            "--user",
            "u1",
            "--json",
        ]);
        assert!(sync.is_ok());
        if let Ok(cli) = sync {
            assert_eq!(mode_for_command(&cli.command), OutputMode::Json);
        }
    }

    #[test]
    fn mode_defaults_to_text() {
        let parsed = parse_from(["finch", "account", "list", "--user", "u1"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            assert_eq!(mode_for_command(&cli.command), OutputMode::Text);
        }
    }
}
