//! Glim server binary.
//!
//! Loads configuration, sets up logging and hands over to the supervisor,
//! which runs the REST API and LDAP listeners until shutdown.

mod cli;
mod supervisor;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use glim_core::config::AppConfig;
use glim_core::config::logging::{LogFormat, LoggingConfig};

use cli::{Cli, Commands, ServerCommand, StartArgs};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Server {
            command: ServerCommand::Start(args),
        } => start(&args).await,
    };

    if let Err(e) = result {
        tracing::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn start(args: &StartArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    init_logging(&config.logging);
    supervisor::run(config).await
}

/// Initialize tracing. `RUST_LOG` takes precedence over the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directive()));

    match config.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}
