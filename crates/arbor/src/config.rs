//! Command-line configuration.
//!
//! Every flag can also be supplied through an environment variable.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ARBOR_DATABASE` | arbor.db | SQLite database file (`:memory:` for a scratch database) |
//! | `ARBOR_TENANT` | default | Tenant the upload belongs to |
//! | `ARBOR_LOG_LEVEL` | info | Log level |
//! | `ARBOR_INSERT_CHUNK_SIZE` | 500 | New assets per insert statement |
//! | `ARBOR_UPDATE_CHUNK_SIZE` | 100 | Changed assets per update batch |
//! | `ARBOR_MAX_REPORTED_ERRORS` | 20 | Validation errors printed before truncating |

use std::path::PathBuf;

use arbor_import::ImportConfig;
use arbor_persistence::TenantId;
use clap::{Parser, Subcommand};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Configuration for the `arbor` command.
#[derive(Debug, Clone, Parser)]
#[command(name = "arbor")]
#[command(about = "Import asset hierarchies from CSV into a tenant's asset register")]
pub struct CliConfig {
    /// SQLite database file.
    #[arg(long, env = "ARBOR_DATABASE", default_value = "arbor.db", global = true)]
    pub database: String,

    /// Tenant the upload belongs to.
    #[arg(short, long, env = "ARBOR_TENANT", default_value = "default", global = true)]
    pub tenant: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "ARBOR_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// New assets written per insert statement.
    #[arg(long, env = "ARBOR_INSERT_CHUNK_SIZE", default_value = "500", global = true)]
    pub insert_chunk_size: usize,

    /// Changed assets written per update batch.
    #[arg(long, env = "ARBOR_UPDATE_CHUNK_SIZE", default_value = "100", global = true)]
    pub update_chunk_size: usize,

    /// Validation errors printed before the report is truncated.
    #[arg(long, env = "ARBOR_MAX_REPORTED_ERRORS", default_value = "20", global = true)]
    pub max_reported_errors: usize,

    #[command(subcommand)]
    pub command: Command,
}

/// What to do with the input file.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check a CSV file against the tenant's assets without writing anything.
    Validate {
        /// CSV file to check.
        file: PathBuf,
    },
    /// Validate a CSV file and apply it to the tenant's assets.
    Import {
        /// CSV file to import.
        file: PathBuf,
    },
}

impl Command {
    /// The input file of either subcommand.
    pub fn file(&self) -> &PathBuf {
        match self {
            Command::Validate { file } | Command::Import { file } => file,
        }
    }
}

impl CliConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database.trim().is_empty() {
            errors.push("Database path cannot be empty".to_string());
        }

        if self.tenant().is_blank() {
            errors.push("Tenant cannot be empty".to_string());
        }

        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(format!(
                "Invalid log level '{}', expected one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        if self.max_reported_errors == 0 {
            errors.push("Max reported errors cannot be 0".to_string());
        }

        if let Err(import_errors) = self.import_config().validate() {
            errors.extend(import_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The tenant as a typed identifier.
    pub fn tenant(&self) -> TenantId {
        TenantId::new(self.tenant.trim())
    }

    /// Import engine settings derived from the flags.
    pub fn import_config(&self) -> ImportConfig {
        ImportConfig {
            insert_chunk_size: self.insert_chunk_size,
            update_chunk_size: self.update_chunk_size,
            max_reported_errors: self.max_reported_errors,
            ..Default::default()
        }
    }

    /// Returns true if the database lives only for this process.
    pub fn is_memory_database(&self) -> bool {
        self.database == ":memory:"
    }
}
