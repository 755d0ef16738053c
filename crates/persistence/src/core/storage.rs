//! Asset store trait.
//!
//! [`AssetStore`] is the record-store contract the import engine is written
//! against. Every operation takes the owning [`TenantId`]; there is no way to
//! read or write another tenant's rows through it.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::tenant::TenantId;
use crate::types::StoredAsset;

use super::transaction::{AssetTransaction, TransactionOptions};

/// Tenant-scoped storage for asset hierarchies.
///
/// Bulk work (fetch, insert, update, level recomputation) goes through an
/// [`AssetTransaction`]. The methods on the store itself autocommit and exist
/// for callers outside an import: listing the tree and soft-deleting assets.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// The transaction type returned by this store.
    type Transaction: AssetTransaction;

    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Begins a new transaction scoped to `tenant`.
    ///
    /// # Errors
    ///
    /// * `StorageError::Backend` - If a connection cannot be acquired
    /// * `StorageError::Transaction` - If the backend refuses to start the transaction
    async fn begin_transaction(
        &self,
        tenant: &TenantId,
        options: TransactionOptions,
    ) -> StorageResult<Self::Transaction>;

    /// Lists the tenant's assets ordered by level, then upload order.
    ///
    /// Soft-deleted assets are included only when `include_deleted` is set.
    async fn list_assets(
        &self,
        tenant: &TenantId,
        include_deleted: bool,
    ) -> StorageResult<Vec<StoredAsset>>;

    /// Counts the tenant's assets.
    async fn count_assets(&self, tenant: &TenantId, include_deleted: bool) -> StorageResult<u64>;

    /// Marks the active asset with `external_id` as deleted.
    ///
    /// Children keep pointing at the deleted row.
    ///
    /// # Errors
    ///
    /// * `StorageError::Asset(ExternalIdNotFound)` - If no active asset has that identifier
    async fn soft_delete_asset(&self, tenant: &TenantId, external_id: &str) -> StorageResult<()>;
}
