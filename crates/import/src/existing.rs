//! Snapshot of a tenant's persisted assets.
//!
//! Loaded once per upload, inside the upload transaction, and shared by
//! validation, categorization and the writers.

use std::collections::{HashMap, HashSet};

use arbor_persistence::core::AssetTransaction;
use arbor_persistence::types::StoredAsset;
use arbor_persistence::StorageResult;
use uuid::Uuid;

/// A persisted asset as seen by the import engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingAsset {
    /// The stored row.
    pub asset: StoredAsset,
    /// External identifier of the parent, when the parent is known.
    pub parent_external_id: Option<String>,
}

impl ExistingAsset {
    /// Returns true if the asset carries a soft-delete marker.
    pub fn is_deleted(&self) -> bool {
        self.asset.is_deleted()
    }
}

/// Lookup structures over every persisted asset of one tenant.
#[derive(Debug, Clone, Default)]
pub struct ExistingState {
    active_ids: HashSet<String>,
    by_external_id: HashMap<String, ExistingAsset>,
    parent_map: HashMap<String, String>,
}

impl ExistingState {
    /// Loads the state through `tx`, soft-deleted assets included.
    pub async fn fetch<T>(tx: &mut T) -> StorageResult<Self>
    where
        T: AssetTransaction + ?Sized,
    {
        let assets = tx.find_all_assets().await?;
        let state = Self::from_assets(assets);

        tracing::debug!(
            tenant = %tx.tenant(),
            assets = state.len(),
            active = state.active_ids.len(),
            "Loaded existing asset state"
        );

        Ok(state)
    }

    /// Builds the lookups from a full list of stored assets.
    ///
    /// When an identifier matches several rows, an active row wins over
    /// soft-deleted ones, and the most recently deleted row wins among
    /// soft-deleted ones.
    pub fn from_assets(assets: Vec<StoredAsset>) -> Self {
        let external_by_internal: HashMap<Uuid, String> = assets
            .iter()
            .map(|a| (a.internal_id, a.external_id.clone()))
            .collect();

        let mut by_external_id: HashMap<String, ExistingAsset> = HashMap::new();
        for asset in assets {
            let parent_external_id = asset
                .parent_internal_id
                .and_then(|p| external_by_internal.get(&p).cloned());

            let replace = match by_external_id.get(&asset.external_id) {
                None => true,
                Some(current) => prefer(&asset, &current.asset),
            };
            if replace {
                by_external_id.insert(
                    asset.external_id.clone(),
                    ExistingAsset {
                        asset,
                        parent_external_id,
                    },
                );
            }
        }

        let active_ids = by_external_id
            .values()
            .filter(|e| !e.is_deleted())
            .map(|e| e.asset.external_id.clone())
            .collect();

        let parent_map = by_external_id
            .values()
            .filter(|e| !e.is_deleted())
            .filter_map(|e| {
                e.parent_external_id
                    .as_ref()
                    .map(|p| (e.asset.external_id.clone(), p.clone()))
            })
            .collect();

        Self {
            active_ids,
            by_external_id,
            parent_map,
        }
    }

    /// Identifiers of active assets.
    pub fn active_ids(&self) -> &HashSet<String> {
        &self.active_ids
    }

    /// Child → parent identifiers, active children only.
    pub fn parent_map(&self) -> &HashMap<String, String> {
        &self.parent_map
    }

    /// Looks up an asset by external identifier.
    pub fn get(&self, external_id: &str) -> Option<&ExistingAsset> {
        self.by_external_id.get(external_id)
    }

    /// Internal key for an external identifier.
    pub fn internal_id(&self, external_id: &str) -> Option<Uuid> {
        self.get(external_id).map(|e| e.asset.internal_id)
    }

    /// Number of distinct external identifiers on file.
    pub fn len(&self) -> usize {
        self.by_external_id.len()
    }

    /// Returns true if the tenant has no assets at all.
    pub fn is_empty(&self) -> bool {
        self.by_external_id.is_empty()
    }
}

/// Whether `candidate` should shadow `current` for the same identifier.
fn prefer(candidate: &StoredAsset, current: &StoredAsset) -> bool {
    match (candidate.deleted_at, current.deleted_at) {
        (None, Some(_)) => true,
        (Some(candidate_at), Some(current_at)) => candidate_at > current_at,
        _ => false,
    }
}
