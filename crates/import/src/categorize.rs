//! Classification of validated records against persisted state.

use arbor_persistence::types::AssetFields;
use uuid::Uuid;

use crate::existing::ExistingState;
use crate::record::AssetRecord;

/// Why a record was classified as changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    /// The persisted match carries a soft-delete marker.
    Resurrected,
    /// The parent reference differs.
    Parent,
    /// The named descriptive field differs.
    Field(&'static str),
}

/// A record that differs from its persisted match.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangedAsset {
    /// The incoming record.
    pub record: AssetRecord,
    /// Internal key of the persisted match.
    pub internal_id: Uuid,
    /// First difference found.
    pub reason: ChangeReason,
}

/// Output of [`categorize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Categorized {
    /// Records with no persisted match.
    pub new_assets: Vec<AssetRecord>,
    /// Records whose persisted match must be overwritten.
    pub changed_assets: Vec<ChangedAsset>,
    /// Records identical to their persisted match.
    pub unchanged_count: usize,
}

/// Treats missing, empty and whitespace-only values alike.
fn normalized(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Returns the first field that differs after normalization.
pub fn first_field_difference(incoming: &AssetFields, stored: &AssetFields) -> Option<&'static str> {
    incoming
        .comparable()
        .zip(stored.comparable())
        .find(|((_, a), (_, b))| normalized(*a) != normalized(*b))
        .map(|((field, _), _)| field)
}

/// Splits `asset_data` into new, changed and unchanged records.
pub fn categorize(asset_data: Vec<AssetRecord>, existing: &ExistingState) -> Categorized {
    let mut result = Categorized::default();

    for record in asset_data {
        let Some(current) = existing.get(&record.external_id) else {
            result.new_assets.push(record);
            continue;
        };

        let reason = if current.is_deleted() {
            Some(ChangeReason::Resurrected)
        } else if normalized(record.parent_external_id.as_deref())
            != normalized(
                existing
                    .parent_map()
                    .get(&record.external_id)
                    .map(String::as_str),
            )
        {
            Some(ChangeReason::Parent)
        } else {
            first_field_difference(&record.fields, &current.asset.fields).map(ChangeReason::Field)
        };

        match reason {
            Some(reason) => {
                tracing::trace!(
                    external_id = %record.external_id,
                    ?reason,
                    "Asset changed"
                );
                result.changed_assets.push(ChangedAsset {
                    internal_id: current.asset.internal_id,
                    record,
                    reason,
                });
            }
            None => result.unchanged_count += 1,
        }
    }

    result
}
