//! Dependency-ordered bulk writes.
//!
//! The store enforces the parent foreign key, so a child can only be
//! written after its parent exists. Both writers sort their batch first and
//! then write it in chunks, in order, inside the caller's transaction.

use std::collections::HashMap;

use arbor_persistence::core::AssetTransaction;
use arbor_persistence::error::AssetError;
use arbor_persistence::types::{AssetUpdate, NewAsset};
use arbor_persistence::{StorageError, StorageResult};
use uuid::Uuid;

use crate::categorize::ChangedAsset;
use crate::existing::ExistingState;
use crate::record::AssetRecord;
use crate::sort::sort_by_dependency_order;

/// Resolves a parent identifier to an internal key.
///
/// Keys generated in this upload take precedence over persisted ones.
fn resolve_parent(
    external_id: &str,
    parent_external_id: Option<&str>,
    new_keys: &HashMap<String, Uuid>,
    existing: &ExistingState,
) -> StorageResult<Option<Uuid>> {
    let Some(parent) = parent_external_id else {
        return Ok(None);
    };

    new_keys
        .get(parent)
        .copied()
        .or_else(|| existing.internal_id(parent))
        .map(Some)
        .ok_or_else(|| {
            StorageError::Asset(AssetError::UnresolvedParent {
                external_id: external_id.to_string(),
                parent_external_id: parent.to_string(),
            })
        })
}

/// Inserts `new_assets` with fresh internal keys.
///
/// Returns the keys generated for this batch, by external identifier.
pub async fn insert_new_assets<T>(
    tx: &mut T,
    new_assets: Vec<AssetRecord>,
    existing: &ExistingState,
    chunk_size: usize,
) -> StorageResult<HashMap<String, Uuid>>
where
    T: AssetTransaction + ?Sized,
{
    if new_assets.is_empty() {
        return Ok(HashMap::new());
    }

    let sorted = sort_by_dependency_order(new_assets);
    let new_keys: HashMap<String, Uuid> = sorted
        .iter()
        .map(|r| (r.external_id.clone(), Uuid::new_v4()))
        .collect();

    let mut payload = Vec::with_capacity(sorted.len());
    for record in sorted {
        let parent_internal_id = resolve_parent(
            &record.external_id,
            record.parent_external_id.as_deref(),
            &new_keys,
            existing,
        )?;
        let internal_id = new_keys[&record.external_id];
        payload.push(NewAsset {
            internal_id,
            external_id: record.external_id,
            parent_internal_id,
            fields: record.fields,
            upload_order: record.upload_order,
        });
    }

    let mut inserted = 0;
    for (chunk_index, chunk) in payload.chunks(chunk_size.max(1)).enumerate() {
        inserted += tx.insert_assets(chunk).await?;
        tracing::debug!(
            tenant = %tx.tenant(),
            chunk = chunk_index,
            rows = chunk.len(),
            "Inserted asset chunk"
        );
    }

    tracing::debug!(tenant = %tx.tenant(), inserted, "Inserted new assets");
    Ok(new_keys)
}

/// Overwrites the persisted match of every changed asset.
///
/// Soft-deleted matches are restored. `new_keys` are the keys returned by
/// [`insert_new_assets`] for this upload. Returns the number of rows updated.
pub async fn update_changed_assets<T>(
    tx: &mut T,
    changed_assets: Vec<ChangedAsset>,
    existing: &ExistingState,
    new_keys: &HashMap<String, Uuid>,
    chunk_size: usize,
) -> StorageResult<usize>
where
    T: AssetTransaction + ?Sized,
{
    if changed_assets.is_empty() {
        return Ok(0);
    }

    let sorted = sort_by_dependency_order(changed_assets);
    let mut updated = 0;

    for (chunk_index, chunk) in sorted.chunks(chunk_size.max(1)).enumerate() {
        for changed in chunk {
            let record = &changed.record;
            let parent_internal_id = resolve_parent(
                &record.external_id,
                record.parent_external_id.as_deref(),
                new_keys,
                existing,
            )?;

            tx.update_asset(&AssetUpdate {
                internal_id: changed.internal_id,
                external_id: record.external_id.clone(),
                parent_internal_id,
                fields: record.fields.clone(),
                upload_order: record.upload_order,
            })
            .await?;
            updated += 1;
        }

        tracing::debug!(
            tenant = %tx.tenant(),
            chunk = chunk_index,
            rows = chunk.len(),
            "Updated asset chunk"
        );
    }

    tracing::debug!(tenant = %tx.tenant(), updated, "Updated changed assets");
    Ok(updated)
}
