//! Arbor Asset Persistence Layer
//!
//! This crate stores tenant-scoped asset hierarchies. Each asset carries a
//! caller-supplied external identifier, a generated internal key, an optional
//! parent link and a depth level. Assets are never physically removed;
//! soft-deleted rows keep their key so a later upload can bring them back.
//!
//! # Backend Features
//!
//! Enable backends with feature flags in `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! arbor-persistence = { version = "0.1", features = ["sqlite"] }
//! ```
//!
//! Available backend features:
//! - `sqlite` (default) - SQLite with in-memory and file modes
//!
//! # Architecture
//!
//! - [`tenant`] - Tenant identifiers
//! - [`types`] - Asset records and write payloads
//! - [`error`] - Error types for all operations
//! - [`core`] - Store and transaction traits
//! - [`backends`] - Backend implementations
//!
//! # Quick Start
//!
//! ```
//! use arbor_persistence::tenant::TenantId;
//! use arbor_persistence::types::{AssetFields, StoredAsset};
//!
//! let tenant = TenantId::new("plant-north");
//! let asset = StoredAsset::new(
//!     tenant.clone(),
//!     "PUMP-01",
//!     AssetFields::named("Feed Pump").with_manufacturer("Acme"),
//! );
//!
//! assert!(asset.is_root());
//! assert!(!asset.is_deleted());
//! assert_eq!(asset.level, 0);
//! ```
//!
//! # Transactions
//!
//! All writes happen inside a transaction obtained from an
//! [`AssetStore`](core::AssetStore). Dropping a transaction without
//! committing rolls it back.
//!
//! ```no_run
//! # #[cfg(feature = "sqlite")]
//! # async fn example() -> Result<(), arbor_persistence::StorageError> {
//! use arbor_persistence::backends::sqlite::SqliteBackend;
//! use arbor_persistence::core::{AssetStore, AssetTransaction, TransactionOptions};
//! use arbor_persistence::tenant::TenantId;
//!
//! let backend = SqliteBackend::in_memory()?;
//! backend.init_schema()?;
//!
//! let tenant = TenantId::new("plant-north");
//! let mut tx = backend.begin_transaction(&tenant, TransactionOptions::new()).await?;
//! let existing = tx.find_all_assets().await?;
//! println!("{} assets on file", existing.len());
//! Box::new(tx).commit().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod tenant;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use tenant::TenantId;
pub use types::{AssetFields, AssetUpdate, HierarchyLink, NewAsset, StoredAsset};

// Re-export core traits
pub use core::{AssetStore, AssetTransaction, TransactionOptions};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
