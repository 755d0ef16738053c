//! Validated asset records ready for persistence.

use arbor_persistence::types::AssetFields;
use serde::{Deserialize, Serialize};

use crate::rows::AssetRow;

/// An upload row that passed structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// External identifier.
    pub external_id: String,
    /// External identifier of the parent; `None` for roots.
    pub parent_external_id: Option<String>,
    /// Descriptive fields with defaults applied.
    pub fields: AssetFields,
    /// 0-based position of the row in the upload.
    pub upload_order: i64,
}

impl AssetRecord {
    /// Creates a root record with the given fields.
    pub fn new(external_id: impl Into<String>, fields: AssetFields) -> Self {
        Self {
            external_id: external_id.into(),
            parent_external_id: None,
            fields,
            upload_order: 0,
        }
    }

    /// Sets the parent identifier.
    pub fn with_parent(mut self, parent_external_id: impl Into<String>) -> Self {
        self.parent_external_id = Some(parent_external_id.into());
        self
    }

    /// Sets the upload position.
    pub fn with_upload_order(mut self, upload_order: i64) -> Self {
        self.upload_order = upload_order;
        self
    }

    /// Builds a record from a row at `index`, applying field defaults.
    ///
    /// Returns `None` when the row has no identifier or no name.
    /// Blank `cmms_internal_id` and `functional_location` fall back to the
    /// identifier; blank location descriptions fall back to the name.
    pub fn from_row(row: &AssetRow, index: usize) -> Option<Self> {
        let row = row.normalized();
        let external_id = row.id.clone()?;
        let name = row.name.clone()?;

        let fields = AssetFields {
            description: row.description.clone(),
            cmms_internal_id: row
                .cmms_internal_id
                .clone()
                .or_else(|| Some(external_id.clone())),
            functional_location: row
                .functional_location
                .clone()
                .or_else(|| Some(external_id.clone())),
            functional_location_desc: row
                .functional_location_desc
                .clone()
                .or_else(|| Some(name.clone())),
            functional_location_long_desc: row
                .functional_location_long_desc
                .clone()
                .or_else(|| Some(name.clone())),
            maintenance_plant: row.maintenance_plant.clone(),
            cmms_system: row.cmms_system.clone(),
            object_type: row.object_type.clone(),
            system_status: row.system_status.clone(),
            make: row.make.clone(),
            manufacturer: row.manufacturer.clone(),
            serial_number: row.serial_number.clone(),
            name,
        };

        Some(Self {
            external_id,
            parent_external_id: row.parent_id.clone(),
            fields,
            upload_order: index as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row_rejects_blank_values() {
        let blank_id = AssetRow {
            row_number: 2,
            id: Some("  ".to_string()),
            name: Some("Pump".to_string()),
            ..Default::default()
        };
        assert!(AssetRecord::from_row(&blank_id, 0).is_none());

        let blank_name = AssetRow {
            row_number: 3,
            id: Some("E1".to_string()),
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(AssetRecord::from_row(&blank_name, 1).is_none());

        let blank_parent = AssetRow {
            row_number: 4,
            id: Some("E1".to_string()),
            name: Some(" Pump ".to_string()),
            parent_id: Some(" ".to_string()),
            functional_location_desc: Some("".to_string()),
            ..Default::default()
        };
        let record = AssetRecord::from_row(&blank_parent, 2).unwrap();
        assert_eq!(record.parent_external_id, None);
        assert_eq!(record.fields.name, "Pump");
        assert_eq!(record.fields.functional_location_desc.as_deref(), Some("Pump"));
    }

    #[test]
    fn test_from_row_applies_defaults() {
        let row = AssetRow::new(2)
            .with_id("E1")
            .with_name("Pump")
            .with_parent("A1")
            .with("serial_number", "SN-9");

        let record = AssetRecord::from_row(&row, 3).unwrap();
        assert_eq!(record.external_id, "E1");
        assert_eq!(record.parent_external_id.as_deref(), Some("A1"));
        assert_eq!(record.upload_order, 3);
        assert_eq!(record.fields.cmms_internal_id.as_deref(), Some("E1"));
        assert_eq!(record.fields.functional_location.as_deref(), Some("E1"));
        assert_eq!(record.fields.functional_location_desc.as_deref(), Some("Pump"));
        assert_eq!(
            record.fields.functional_location_long_desc.as_deref(),
            Some("Pump")
        );
        assert_eq!(record.fields.serial_number.as_deref(), Some("SN-9"));
        assert_eq!(record.fields.description, None);
    }

    #[test]
    fn test_from_row_keeps_supplied_values() {
        let row = AssetRow::new(2)
            .with_id("E1")
            .with_name("Pump")
            .with("cmms_internal_id", "10004711")
            .with("functional_location", "PLT-A1-E1")
            .with("functional_location_desc", "Feed pump");

        let record = AssetRecord::from_row(&row, 0).unwrap();
        assert_eq!(record.fields.cmms_internal_id.as_deref(), Some("10004711"));
        assert_eq!(record.fields.functional_location.as_deref(), Some("PLT-A1-E1"));
        assert_eq!(
            record.fields.functional_location_desc.as_deref(),
            Some("Feed pump")
        );
    }

    #[test]
    fn test_from_row_requires_id_and_name() {
        assert!(AssetRecord::from_row(&AssetRow::new(2).with_name("Pump"), 0).is_none());
        assert!(AssetRecord::from_row(&AssetRow::new(2).with_id("E1"), 0).is_none());
    }
}
