//! SQLite backend implementation.
//!
//! Implements [`AssetStore`](crate::core::AssetStore) and
//! [`AssetTransaction`](crate::core::AssetTransaction) on top of an `r2d2`
//! pool of `rusqlite` connections. In-memory databases are handy for tests;
//! file-based databases use WAL mode.
//!
//! # Example
//!
//! ```no_run
//! use arbor_persistence::backends::sqlite::SqliteBackend;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::in_memory()?;
//! backend.init_schema()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE assets (
//!     internal_id TEXT PRIMARY KEY,
//!     tenant_id TEXT NOT NULL,
//!     external_id TEXT NOT NULL,
//!     parent_internal_id TEXT REFERENCES assets(internal_id),
//!     name TEXT NOT NULL,
//!     -- descriptive columns ...
//!     level INTEGER NOT NULL DEFAULT 0,
//!     upload_order INTEGER NOT NULL DEFAULT 0,
//!     created_at TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     deleted_at TEXT
//! );
//!
//! -- External ids are unique among active rows only.
//! CREATE UNIQUE INDEX idx_assets_active_external_id
//!     ON assets(tenant_id, external_id) WHERE deleted_at IS NULL;
//! ```

mod backend;
mod schema;
mod storage;
mod transaction;

pub use backend::{DatabaseLocation, SqliteBackend, SqliteBackendConfig};
pub use transaction::SqliteTransaction;
