//! Command-line arguments.

use clap::{Parser, Subcommand};

/// inbox451: multi-tenant mailbox service.
#[derive(Debug, Parser)]
#[command(name = "inbox451", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create the database schema, optionally with a first admin user.
    ///
    /// The admin password is read from `INBOX451_ADMIN_PASSWORD`.
    Init {
        /// Login name of the admin to create.
        #[arg(requires = "admin_email")]
        admin_username: Option<String>,

        /// Contact address of the admin to create.
        admin_email: Option<String>,
    },
    /// Route one RFC 822 message read from stdin and store it.
    Deliver {
        /// Envelope sender (MAIL FROM). Use "<>" for the null sender.
        sender: String,

        /// Envelope receiver (RCPT TO).
        receiver: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("inbox451").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    #[test]
    fn test_parse_init() {
        assert_eq!(
            parse(&["init"]).unwrap(),
            Command::Init {
                admin_username: None,
                admin_email: None,
            }
        );
        assert_eq!(
            parse(&["init", "root", "root@x.com"]).unwrap(),
            Command::Init {
                admin_username: Some("root".into()),
                admin_email: Some("root@x.com".into()),
            }
        );
        assert_eq!(
            parse(&["init", "root"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_parse_deliver() {
        assert_eq!(
            parse(&["deliver", "<>", "a@x.com"]).unwrap(),
            Command::Deliver {
                sender: "<>".into(),
                receiver: "a@x.com".into(),
            }
        );
        assert_eq!(
            parse(&["deliver", "s@y.com"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse(&[]).unwrap_err().kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
        assert_eq!(
            parse(&["serve"]).unwrap_err().kind(),
            ErrorKind::InvalidSubcommand
        );
        assert_eq!(parse(&["--help"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
        assert_eq!(parse(&["--version"]).unwrap_err().kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
