//! Arbor asset hierarchy importer.
//!
//! Reads a CSV export from a maintenance system and validates it against,
//! or applies it to, a tenant's asset register in SQLite.

mod commands;
mod config;
mod logging;

use clap::Parser;
use tracing::info;

use crate::config::{CliConfig, Command};
use crate::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let tenant = config.tenant();
    info!(
        tenant = %tenant,
        database = %config.database,
        file = %config.command.file().display(),
        "Starting arbor"
    );
    if config.is_memory_database() {
        info!("Using an in-memory database, nothing will be kept after exit");
    }

    let uploader = commands::create_uploader(&config)?;
    let mut stdout = std::io::stdout().lock();
    let succeeded = match &config.command {
        Command::Validate { file } => {
            commands::validate(&uploader, &tenant, file, &mut stdout).await?
        }
        Command::Import { file } => commands::import(&uploader, &tenant, file, &mut stdout).await?,
    };

    if !succeeded {
        std::process::exit(2);
    }

    Ok(())
}
