//! Arbor Asset Import Engine
//!
//! Bulk import of tenant asset hierarchies. An upload is a list of rows,
//! each describing one asset and, optionally, its parent. The engine
//! checks the rows for structural problems, compares them with what the
//! tenant already has, and applies the smallest set of inserts and updates
//! in an order the store's parent foreign key accepts. Hierarchy levels are
//! recomputed afterwards.
//!
//! # Architecture
//!
//! - [`rows`] - Upload rows and the CSV row normalizer
//! - [`validation`] - Identifier, name, parent and cycle checks
//! - [`existing`] - Snapshot of persisted assets
//! - [`categorize`] - New / changed / unchanged classification
//! - [`sort`] - Parent-first ordering
//! - [`writer`] - Chunked inserts and updates
//! - [`levels`] - Depth recomputation
//! - [`uploader`] - The transactional orchestrator
//! - [`report`] - Human-readable error reports
//! - [`notify`] - Upload notifications
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use arbor_import::{AssetUploader, UploadOutcome, report::ErrorReport, rows::read_csv_rows};
//! use arbor_persistence::backends::sqlite::SqliteBackend;
//! use arbor_persistence::TenantId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::open("assets.db")?;
//! backend.init_schema()?;
//!
//! let uploader = AssetUploader::new(Arc::new(backend));
//! let rows = read_csv_rows("id,name,parent_id\nP1,Plant,\nA1,Area,P1\n".as_bytes())?;
//!
//! match uploader.upload(&TenantId::new("plant-north"), &rows).await? {
//!     UploadOutcome::Completed(summary) => println!("{} created", summary.created_count),
//!     UploadOutcome::Rejected(result) => println!("{}", ErrorReport::new(&result.errors)),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod categorize;
pub mod config;
pub mod error;
pub mod existing;
pub mod levels;
pub mod notify;
pub mod record;
pub mod report;
pub mod rows;
pub mod sort;
pub mod uploader;
pub mod validation;
pub mod writer;

pub use config::ImportConfig;
pub use error::{ImportError, ImportResult, NotifyError};
pub use notify::{LogNotifier, UploadEvent, UploadNotifier};
pub use record::AssetRecord;
pub use rows::AssetRow;
pub use uploader::{AssetUploader, UploadOutcome, UploadSummary};
pub use validation::{RowError, ValidationResult};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
