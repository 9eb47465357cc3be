use super::{Parser, Subcommand};
use crate::domain_model::UserId;

#[derive(Parser, Debug)]
#[command(name = "tokenwarden", version, about = "Session client for the identity service")]
pub struct Cli {
    #[arg(long, global = true)]
    pub settings: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Exchange credentials for a session and store it
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    Register {
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password_confirm: Option<String>,
    },
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
    /// Staff-only user management
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    List,
    Create {
        username: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        staff: bool,
        #[arg(long)]
        inactive: bool,
    },
    Delete {
        id: UserId,
    },
    ResetPassword {
        id: UserId,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_user_commands() {
        let cli = Cli::parse_from([
            "tokenwarden",
            "users",
            "reset-password",
            "42",
            "--password",
            "a",
            "--confirm",
            "a",
            "--settings",
            "settings/release.toml",
        ]);

        assert_eq!(cli.settings.as_deref(), Some("settings/release.toml"));
        match cli.command {
            Some(Command::Users {
                command: UsersCommand::ResetPassword { id, .. },
            }) => assert_eq!(id, UserId(42)),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn settings_only_is_valid() {
        let cli = Cli::parse_from(["tokenwarden", "--settings", "settings/dev.toml"]);

        assert!(cli.command.is_none());
    }
}
