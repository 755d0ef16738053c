//! Stored asset types.
//!
//! An asset is identified two ways: by the `external_id` supplied by the
//! upload source (for example a CMMS key), and by a system-generated
//! `internal_id` that parent links actually point at. Only the internal key
//! is used as a foreign key, so the external identifier scheme can change
//! without rewriting links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tenant::TenantId;

/// The descriptive fields of an asset.
///
/// These are exactly the fields the import engine compares when deciding
/// whether an incoming asset differs from its persisted counterpart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFields {
    /// Display name. Always present.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Key of the asset in the originating CMMS.
    pub cmms_internal_id: Option<String>,
    /// Functional location code.
    pub functional_location: Option<String>,
    /// Short functional location description.
    pub functional_location_desc: Option<String>,
    /// Long functional location description.
    pub functional_location_long_desc: Option<String>,
    /// Maintenance plant code.
    pub maintenance_plant: Option<String>,
    /// Name of the originating CMMS.
    pub cmms_system: Option<String>,
    /// Equipment object type.
    pub object_type: Option<String>,
    /// CMMS system status.
    pub system_status: Option<String>,
    /// Make or model line.
    pub make: Option<String>,
    /// Manufacturer name.
    pub manufacturer: Option<String>,
    /// Serial number.
    pub serial_number: Option<String>,
}

impl AssetFields {
    /// Creates a field set with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the manufacturer.
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Sets the serial number.
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Returns every comparable field as a `(column name, value)` pair.
    ///
    /// The order is fixed and matches the storage column order.
    pub fn comparable(&self) -> impl Iterator<Item = (&'static str, Option<&str>)> + '_ {
        [
            ("name", Some(self.name.as_str())),
            ("description", self.description.as_deref()),
            ("cmms_internal_id", self.cmms_internal_id.as_deref()),
            ("functional_location", self.functional_location.as_deref()),
            (
                "functional_location_desc",
                self.functional_location_desc.as_deref(),
            ),
            (
                "functional_location_long_desc",
                self.functional_location_long_desc.as_deref(),
            ),
            ("maintenance_plant", self.maintenance_plant.as_deref()),
            ("cmms_system", self.cmms_system.as_deref()),
            ("object_type", self.object_type.as_deref()),
            ("system_status", self.system_status.as_deref()),
            ("make", self.make.as_deref()),
            ("manufacturer", self.manufacturer.as_deref()),
            ("serial_number", self.serial_number.as_deref()),
        ]
        .into_iter()
    }
}

/// An asset row with persistence metadata.
///
/// # Examples
///
/// ```
/// use arbor_persistence::types::{AssetFields, StoredAsset};
/// use arbor_persistence::tenant::TenantId;
///
/// let asset = StoredAsset::new(TenantId::new("acme"), "P1", AssetFields::named("Plant"));
/// assert!(asset.is_root());
/// assert!(!asset.is_deleted());
/// assert_eq!(asset.level, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAsset {
    /// Surrogate key; target of parent links.
    pub internal_id: Uuid,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Identifier supplied by the upload source.
    pub external_id: String,
    /// Internal key of the parent, `None` for roots.
    pub parent_internal_id: Option<Uuid>,
    /// Descriptive fields.
    pub fields: AssetFields,
    /// Depth from the nearest root (root = 0). Derived.
    pub level: i32,
    /// Position of the asset in the file that last wrote it.
    pub upload_order: i64,
    /// When the row was first inserted.
    pub created_at: DateTime<Utc>,
    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StoredAsset {
    /// Creates a fresh, parentless, active asset with a new internal key.
    pub fn new(tenant_id: TenantId, external_id: impl Into<String>, fields: AssetFields) -> Self {
        let now = Utc::now();
        Self {
            internal_id: Uuid::new_v4(),
            tenant_id,
            external_id: external_id.into(),
            parent_internal_id: None,
            fields,
            level: 0,
            upload_order: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Returns `true` if the asset carries a soft-delete marker.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns `true` if the asset has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_internal_id.is_none()
    }

    /// Returns the parent link of this asset.
    pub fn link(&self) -> HierarchyLink {
        HierarchyLink {
            internal_id: self.internal_id,
            parent_internal_id: self.parent_internal_id,
        }
    }
}

/// Payload for inserting a new asset.
///
/// Inserted rows are always active and start at level 0; levels are
/// recomputed after the write phase.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAsset {
    /// Internal key of the row.
    pub internal_id: Uuid,
    /// External identifier of the row.
    pub external_id: String,
    /// Resolved parent key, `None` for roots.
    pub parent_internal_id: Option<Uuid>,
    /// Descriptive fields to write.
    pub fields: AssetFields,
    /// Position in the upload.
    pub upload_order: i64,
}

/// Payload for updating an existing asset in place.
///
/// Applying an update always clears the soft-delete marker, which is how a
/// deleted asset is resurrected.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetUpdate {
    /// Internal key of the row.
    pub internal_id: Uuid,
    /// External identifier of the row.
    pub external_id: String,
    /// Resolved parent key, `None` for roots.
    pub parent_internal_id: Option<Uuid>,
    /// Descriptive fields to write.
    pub fields: AssetFields,
    /// Position in the upload.
    pub upload_order: i64,
}

/// A `(node, parent)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HierarchyLink {
    /// The node.
    pub internal_id: Uuid,
    /// Its parent, `None` for roots.
    pub parent_internal_id: Option<Uuid>,
}
