//! Core storage traits and abstractions.
//!
//! - [`AssetStore`] - Tenant-scoped entry point to a backend
//! - [`AssetTransaction`] - The unit of work every import runs inside
//!
//! ```text
//! AssetStore
//!     ├── list_assets / count_assets / soft_delete_asset   (autocommit)
//!     └── begin_transaction ──► AssetTransaction
//!                                   ├── find_all_assets
//!                                   ├── insert_assets / update_asset
//!                                   ├── find_hierarchy_links / update_levels
//!                                   └── commit | rollback
//! ```
//!
//! # Example: running a unit of work
//!
//! ```ignore
//! use arbor_persistence::core::{AssetStore, AssetTransaction, TransactionOptions};
//!
//! async fn touch_levels<S: AssetStore>(store: &S, tenant: &TenantId) -> StorageResult<()> {
//!     let mut tx = store.begin_transaction(tenant, TransactionOptions::new()).await?;
//!     let links = tx.find_hierarchy_links().await?;
//!     let roots: Vec<_> = links
//!         .iter()
//!         .filter(|l| l.parent_internal_id.is_none())
//!         .map(|l| l.internal_id)
//!         .collect();
//!     tx.update_levels(0, &roots).await?;
//!     Box::new(tx).commit().await
//! }
//! ```

pub mod storage;
pub mod transaction;

pub use storage::AssetStore;
pub use transaction::{AssetTransaction, TransactionOptions};
