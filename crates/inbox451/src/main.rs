//! # inbox451
//!
//! Command-line entry point: sets up logging and configuration, creates the
//! schema, and delivers single messages through the ingestion pipeline the
//! way a mail listener would.

mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use inbox451_core::{Config, Envelope, Error, ErrorKind, Services, User, UserRole};
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};

/// sysexits.h: command line usage error.
const EX_USAGE: u8 = 64;
/// sysexits.h: addressee unknown.
const EX_NOUSER: u8 = 67;
/// sysexits.h: temporary failure, the sender should retry.
const EX_TEMPFAIL: u8 = 75;
/// sysexits.h: configuration error.
const EX_CONFIG: u8 = 78;

/// Environment variable holding the password of the admin created by `init`.
const ADMIN_PASSWORD_VAR: &str = "INBOX451_ADMIN_PASSWORD";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors
            return if e.use_stderr() {
                ExitCode::from(EX_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = match Config::load(Config::default_path().as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("inbox451: {e}");
            return ExitCode::from(EX_CONFIG);
        }
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Init {
            admin_username,
            admin_email,
        } => match init(&config, admin_username.zip(admin_email)).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Initialization failed: {e:#}");
                ExitCode::FAILURE
            }
        },
        Command::Deliver { sender, receiver } => deliver(&config, &sender, &receiver).await,
    }
}

/// Create the schema and, if requested, the first admin account.
async fn init(config: &Config, admin: Option<(String, String)>) -> anyhow::Result<()> {
    let services = Services::connect(config)
        .await
        .with_context(|| format!("Failed to open {}", config.database.url))?;

    if let Some((username, email)) = admin {
        let password = std::env::var(ADMIN_PASSWORD_VAR)
            .with_context(|| format!("{ADMIN_PASSWORD_VAR} must be set to create an admin"))?;
        let user = User::new(&username, &username, &email).with_role(UserRole::Admin);

        match services.users.create(user, &password).await {
            Ok(user) => info!(user_id = ?user.id, "Created admin {username}"),
            Err(Error::Conflict { .. }) => warn!("Admin {username} already exists"),
            Err(e) => return Err(e).context("Failed to create admin"),
        }
    }

    services.db.close().await;
    info!("Database initialized at {}", config.database.url);
    Ok(())
}

/// Ingest stdin and translate the outcome into a sysexits code.
async fn deliver(config: &Config, sender: &str, receiver: &str) -> ExitCode {
    let mut raw = Vec::new();
    if let Err(e) = tokio::io::stdin().read_to_end(&mut raw).await {
        error!("Failed to read message: {e}");
        return ExitCode::from(EX_TEMPFAIL);
    }

    let services = match Services::connect(config).await {
        Ok(services) => services,
        Err(e) => {
            error!("Failed to open {}: {e}", config.database.url);
            return ExitCode::from(EX_TEMPFAIL);
        }
    };

    let envelope = Envelope::from_rfc822(sender, receiver, &raw);
    let result = services.ingest.ingest(&envelope).await;
    services.db.close().await;

    match result {
        Ok(delivery) => {
            println!("{} {}", delivery.route, delivery.message.inbox_id);
            ExitCode::SUCCESS
        }
        Err(e) if e.kind() == ErrorKind::AddressNotRecognized => {
            eprintln!("inbox451: {e}");
            ExitCode::from(EX_NOUSER)
        }
        Err(e) => {
            eprintln!("inbox451: {e}");
            ExitCode::from(EX_TEMPFAIL)
        }
    }
}
