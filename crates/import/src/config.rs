//! Import engine configuration.
//!
//! Every field has a serde default, so an empty document yields the
//! standard configuration:
//!
//! | Field | Default | Description |
//! |-------|---------|-------------|
//! | `insert_chunk_size` | 500 | New assets per insert call |
//! | `update_chunk_size` | 100 | Changed assets per update chunk |
//! | `max_reported_errors` | 20 | Errors shown in a report before the remainder line |
//! | `report_value_width` | 100 | Characters of an offending value shown in a report |
//!
//! # Example
//!
//! ```rust
//! use arbor_import::ImportConfig;
//!
//! let config = ImportConfig {
//!     insert_chunk_size: 250,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ImportError, ImportResult};

/// Tunables for the import pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Number of new assets written per insert call.
    #[serde(default = "default_insert_chunk_size")]
    pub insert_chunk_size: usize,

    /// Number of changed assets updated per chunk.
    #[serde(default = "default_update_chunk_size")]
    pub update_chunk_size: usize,

    /// Maximum number of errors rendered in an error report.
    #[serde(default = "default_max_reported_errors")]
    pub max_reported_errors: usize,

    /// Maximum number of characters of a value rendered in an error report.
    #[serde(default = "default_report_value_width")]
    pub report_value_width: usize,
}

fn default_insert_chunk_size() -> usize {
    500
}

fn default_update_chunk_size() -> usize {
    100
}

fn default_max_reported_errors() -> usize {
    20
}

fn default_report_value_width() -> usize {
    100
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            insert_chunk_size: default_insert_chunk_size(),
            update_chunk_size: default_update_chunk_size(),
            max_reported_errors: default_max_reported_errors(),
            report_value_width: default_report_value_width(),
        }
    }
}

impl ImportConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.insert_chunk_size == 0 {
            errors.push("Insert chunk size cannot be 0".to_string());
        }

        if self.update_chunk_size == 0 {
            errors.push("Update chunk size cannot be 0".to_string());
        }

        if self.report_value_width == 0 {
            errors.push("Report value width cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Like [`validate`](Self::validate), but as an [`ImportError`].
    pub fn ensure_valid(&self) -> ImportResult<()> {
        self.validate().map_err(ImportError::Config)
    }
}
