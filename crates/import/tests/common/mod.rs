//! Shared fixtures for import integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use arbor_import::{AssetRow, AssetUploader, NotifyError, UploadEvent, UploadNotifier};
use arbor_persistence::backends::sqlite::{SqliteBackend, SqliteTransaction};
use arbor_persistence::core::{AssetStore, AssetTransaction, TransactionOptions};
use arbor_persistence::error::BackendError;
use arbor_persistence::tenant::TenantId;
use arbor_persistence::types::{AssetUpdate, HierarchyLink, NewAsset, StoredAsset};
use arbor_persistence::{StorageError, StorageResult};
use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

pub fn create_backend() -> SqliteBackend {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to initialize schema");
    backend
}

pub fn create_uploader() -> AssetUploader<SqliteBackend> {
    AssetUploader::new(Arc::new(create_backend()))
}

pub fn create_tenant(id: &str) -> TenantId {
    TenantId::new(id)
}

pub fn row(n: usize, id: &str, name: &str, parent: Option<&str>) -> AssetRow {
    let row = AssetRow::new(n).with_id(id).with_name(name);
    match parent {
        Some(p) => row.with_parent(p),
        None => row,
    }
}

/// Plant / Area / Pump, the smallest three-level tree.
pub fn plant_rows() -> Vec<AssetRow> {
    vec![
        row(2, "P1", "Plant", None),
        row(3, "A1", "Area", Some("P1")),
        row(4, "E1", "Pump", Some("A1")),
    ]
}

/// A tree of `n` assets where asset `i` hangs under asset `i / 3`.
pub fn tree_rows(n: usize) -> Vec<AssetRow> {
    (0..n)
        .map(|i| {
            let parent = (i > 0).then(|| format!("N{}", i / 3));
            row(i + 2, &format!("N{i}"), &format!("Node {i}"), parent.as_deref())
        })
        .collect()
}

/// Active assets of the tenant, keyed by external id.
pub async fn active_by_id<S: AssetStore>(
    store: &S,
    tenant: &TenantId,
) -> HashMap<String, StoredAsset> {
    store
        .list_assets(tenant, false)
        .await
        .unwrap()
        .into_iter()
        .map(|a| (a.external_id.clone(), a))
        .collect()
}

/// Asserts `level == parent.level + 1` (or 0 for roots) for every active asset.
pub async fn assert_levels_consistent<S: AssetStore>(store: &S, tenant: &TenantId) {
    let all: HashMap<Uuid, StoredAsset> = store
        .list_assets(tenant, true)
        .await
        .unwrap()
        .into_iter()
        .map(|a| (a.internal_id, a))
        .collect();

    for asset in all.values().filter(|a| !a.is_deleted()) {
        let expected = match asset.parent_internal_id {
            Some(parent) => all[&parent].level + 1,
            None => 0,
        };
        assert_eq!(
            asset.level, expected,
            "asset {} has level {} but expected {}",
            asset.external_id, asset.level, expected
        );
    }
}

// ============================================================================
// Notifiers
// ============================================================================

/// Forwards every event to a channel; optionally reports failure afterwards.
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<UploadEvent>,
    fail: bool,
}

impl ChannelNotifier {
    pub fn new(fail: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<UploadEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Arc::new(Self { sender, fail }), receiver)
    }
}

#[async_trait]
impl UploadNotifier for ChannelNotifier {
    async fn notify(&self, event: &UploadEvent) -> Result<(), NotifyError> {
        let _ = self.sender.send(event.clone());
        if self.fail {
            return Err(NotifyError::new("mail relay unavailable"));
        }
        Ok(())
    }
}

// ============================================================================
// Failure injection
// ============================================================================

/// Wraps the SQLite backend and fails level updates on demand.
pub struct FlakyStore {
    inner: SqliteBackend,
    fail_level_updates: bool,
}

impl FlakyStore {
    pub fn new(fail_level_updates: bool) -> Self {
        Self {
            inner: create_backend(),
            fail_level_updates,
        }
    }
}

pub struct FlakyTransaction {
    inner: SqliteTransaction,
    fail_level_updates: bool,
}

#[async_trait]
impl AssetStore for FlakyStore {
    type Transaction = FlakyTransaction;

    fn backend_name(&self) -> &'static str {
        "flaky-sqlite"
    }

    async fn begin_transaction(
        &self,
        tenant: &TenantId,
        options: TransactionOptions,
    ) -> StorageResult<Self::Transaction> {
        Ok(FlakyTransaction {
            inner: self.inner.begin_transaction(tenant, options).await?,
            fail_level_updates: self.fail_level_updates,
        })
    }

    async fn list_assets(
        &self,
        tenant: &TenantId,
        include_deleted: bool,
    ) -> StorageResult<Vec<StoredAsset>> {
        self.inner.list_assets(tenant, include_deleted).await
    }

    async fn count_assets(&self, tenant: &TenantId, include_deleted: bool) -> StorageResult<u64> {
        self.inner.count_assets(tenant, include_deleted).await
    }

    async fn soft_delete_asset(&self, tenant: &TenantId, external_id: &str) -> StorageResult<()> {
        self.inner.soft_delete_asset(tenant, external_id).await
    }
}

#[async_trait]
impl AssetTransaction for FlakyTransaction {
    async fn find_all_assets(&mut self) -> StorageResult<Vec<StoredAsset>> {
        self.inner.find_all_assets().await
    }

    async fn insert_assets(&mut self, assets: &[NewAsset]) -> StorageResult<usize> {
        self.inner.insert_assets(assets).await
    }

    async fn update_asset(&mut self, update: &AssetUpdate) -> StorageResult<()> {
        self.inner.update_asset(update).await
    }

    async fn find_hierarchy_links(&mut self) -> StorageResult<Vec<HierarchyLink>> {
        self.inner.find_hierarchy_links().await
    }

    async fn update_levels(&mut self, level: i32, internal_ids: &[Uuid]) -> StorageResult<usize> {
        if self.fail_level_updates {
            return Err(StorageError::Backend(BackendError::QueryError {
                message: "simulated level write failure".to_string(),
            }));
        }
        self.inner.update_levels(level, internal_ids).await
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        Box::new(self.inner).commit().await
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        Box::new(self.inner).rollback().await
    }

    fn tenant(&self) -> &TenantId {
        self.inner.tenant()
    }

    fn is_active(&self) -> bool {
        self.inner.is_active()
    }
}
