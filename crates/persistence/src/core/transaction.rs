//! Transaction trait for atomic asset writes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StorageResult;
use crate::tenant::TenantId;
use crate::types::{AssetUpdate, HierarchyLink, NewAsset, StoredAsset};

/// Options for starting a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    /// Whether this is a read-only transaction.
    pub read_only: bool,
}

impl TransactionOptions {
    /// Creates new options with defaults (read-write).
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks this as a read-only transaction.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// An active unit of work against one tenant's assets.
///
/// Changes become visible to other connections only after
/// [`commit`](Self::commit). A transaction that is dropped while still
/// active is rolled back.
#[async_trait]
pub trait AssetTransaction: Send + Sync {
    /// Loads every asset of the tenant, soft-deleted ones included.
    async fn find_all_assets(&mut self) -> StorageResult<Vec<StoredAsset>>;

    /// Inserts a batch of new, active assets.
    ///
    /// Parents must either already exist or appear earlier in the same
    /// call's slice; the backend enforces the parent foreign key.
    /// Returns the number of rows written.
    async fn insert_assets(&mut self, assets: &[NewAsset]) -> StorageResult<usize>;

    /// Overwrites one existing asset, clearing its soft-delete marker.
    ///
    /// # Errors
    ///
    /// * `StorageError::Asset(NotFound)` - If no row has the given internal key
    async fn update_asset(&mut self, update: &AssetUpdate) -> StorageResult<()>;

    /// Loads the `(node, parent)` pair of every asset of the tenant.
    async fn find_hierarchy_links(&mut self) -> StorageResult<Vec<HierarchyLink>>;

    /// Sets `level` on every listed asset. Returns the number of rows touched.
    async fn update_levels(&mut self, level: i32, internal_ids: &[Uuid]) -> StorageResult<usize>;

    /// Commits the transaction, persisting all changes.
    async fn commit(self: Box<Self>) -> StorageResult<()>;

    /// Rolls back the transaction, discarding all changes.
    async fn rollback(self: Box<Self>) -> StorageResult<()>;

    /// Returns the tenant this transaction is scoped to.
    fn tenant(&self) -> &TenantId;

    /// Returns whether this transaction is still active.
    fn is_active(&self) -> bool;
}
