//! Upload rows and the CSV row normalizer.
//!
//! An [`AssetRow`] is one line of an upload after normalization: every
//! recognized column is either a trimmed, non-empty string or `None`, and
//! the row remembers where it came from so errors can point back at it.
//!
//! [`read_csv_rows`] turns a CSV document into rows:
//!
//! - headers are trimmed, lowercased, and spaces/hyphens become underscores
//!   (`"Parent ID"` → `parent_id`)
//! - unrecognized columns are ignored
//! - blank lines are skipped
//! - `row_number` is the line in the file, so the first data line is row 2
//!
//! # Example
//!
//! ```rust
//! use arbor_import::rows::read_csv_rows;
//!
//! let csv = "ID,Name,Parent ID\nP1,Plant,\nA1,Area,P1\n";
//! let rows = read_csv_rows(csv.as_bytes()).unwrap();
//!
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[1].row_number, 3);
//! assert_eq!(rows[1].parent_id.as_deref(), Some("P1"));
//! assert_eq!(rows[0].parent_id, None);
//! ```

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ImportError, ImportResult};

/// Column names an upload may carry, in canonical order.
pub const RECOGNIZED_COLUMNS: [&str; 15] = [
    "id",
    "name",
    "description",
    "cmms_internal_id",
    "functional_location",
    "functional_location_desc",
    "functional_location_long_desc",
    "maintenance_plant",
    "cmms_system",
    "object_type",
    "system_status",
    "make",
    "manufacturer",
    "serial_number",
    "parent_id",
];

/// Columns whose header must be present in a CSV upload.
pub const REQUIRED_COLUMNS: [&str; 2] = ["id", "name"];

/// One normalized upload row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRow {
    /// 1-based position of the row in its source.
    pub row_number: usize,
    /// External identifier.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Key in the source CMMS.
    pub cmms_internal_id: Option<String>,
    /// Functional location code.
    pub functional_location: Option<String>,
    /// Short functional location description.
    pub functional_location_desc: Option<String>,
    /// Long functional location description.
    pub functional_location_long_desc: Option<String>,
    /// Maintenance plant.
    pub maintenance_plant: Option<String>,
    /// Source CMMS system.
    pub cmms_system: Option<String>,
    /// Object type.
    pub object_type: Option<String>,
    /// System status.
    pub system_status: Option<String>,
    /// Make.
    pub make: Option<String>,
    /// Manufacturer.
    pub manufacturer: Option<String>,
    /// Serial number.
    pub serial_number: Option<String>,
    /// External identifier of the parent, if any.
    pub parent_id: Option<String>,
}

/// Trims a raw cell; blank cells become `None`.
pub fn normalize_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalizes a header cell to a column name.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Returns the canonical column for a normalized header, if recognized.
pub fn recognized_column(header: &str) -> Option<&'static str> {
    RECOGNIZED_COLUMNS.iter().copied().find(|c| *c == header)
}

impl AssetRow {
    /// Creates an empty row.
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            ..Default::default()
        }
    }

    /// Sets the identifier.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = normalize_value(id);
        self
    }

    /// Sets the name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = normalize_value(name);
        self
    }

    /// Sets the parent identifier.
    pub fn with_parent(mut self, parent_id: &str) -> Self {
        self.parent_id = normalize_value(parent_id);
        self
    }

    /// Sets any recognized column. Unknown columns are ignored.
    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.set(column, normalize_value(value));
        self
    }

    /// Stores `value` under `column`; returns `false` for unknown columns.
    pub fn set(&mut self, column: &str, value: Option<String>) -> bool {
        let slot = match column {
            "id" => &mut self.id,
            "name" => &mut self.name,
            "description" => &mut self.description,
            "cmms_internal_id" => &mut self.cmms_internal_id,
            "functional_location" => &mut self.functional_location,
            "functional_location_desc" => &mut self.functional_location_desc,
            "functional_location_long_desc" => &mut self.functional_location_long_desc,
            "maintenance_plant" => &mut self.maintenance_plant,
            "cmms_system" => &mut self.cmms_system,
            "object_type" => &mut self.object_type,
            "system_status" => &mut self.system_status,
            "make" => &mut self.make,
            "manufacturer" => &mut self.manufacturer,
            "serial_number" => &mut self.serial_number,
            "parent_id" => &mut self.parent_id,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Returns a copy with every value trimmed and blank values cleared.
    ///
    /// Rows read by [`read_csv_rows`] are already in this form; rows built
    /// by hand or deserialized may not be.
    pub fn normalized(&self) -> Self {
        let clean = |value: &Option<String>| value.as_deref().and_then(normalize_value);
        Self {
            row_number: self.row_number,
            id: clean(&self.id),
            name: clean(&self.name),
            description: clean(&self.description),
            cmms_internal_id: clean(&self.cmms_internal_id),
            functional_location: clean(&self.functional_location),
            functional_location_desc: clean(&self.functional_location_desc),
            functional_location_long_desc: clean(&self.functional_location_long_desc),
            maintenance_plant: clean(&self.maintenance_plant),
            cmms_system: clean(&self.cmms_system),
            object_type: clean(&self.object_type),
            system_status: clean(&self.system_status),
            make: clean(&self.make),
            manufacturer: clean(&self.manufacturer),
            serial_number: clean(&self.serial_number),
            parent_id: clean(&self.parent_id),
        }
    }

    /// Returns true when every column is empty.
    pub fn is_blank(&self) -> bool {
        self.id.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.cmms_internal_id.is_none()
            && self.functional_location.is_none()
            && self.functional_location_desc.is_none()
            && self.functional_location_long_desc.is_none()
            && self.maintenance_plant.is_none()
            && self.cmms_system.is_none()
            && self.object_type.is_none()
            && self.system_status.is_none()
            && self.make.is_none()
            && self.manufacturer.is_none()
            && self.serial_number.is_none()
            && self.parent_id.is_none()
    }
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

/// Reads upload rows from CSV data.
pub fn read_csv_rows<R: Read>(reader: R) -> ImportResult<Vec<AssetRow>> {
    rows_from_reader(reader_builder().from_reader(reader))
}

/// Reads upload rows from a CSV file.
pub fn read_csv_file<P: AsRef<Path>>(path: P) -> ImportResult<Vec<AssetRow>> {
    rows_from_reader(reader_builder().from_path(path)?)
}

fn rows_from_reader<R: Read>(mut reader: csv::Reader<R>) -> ImportResult<Vec<AssetRow>> {
    // First occurrence of a repeated header wins
    let mut seen = HashSet::new();
    let columns: Vec<Option<&'static str>> = reader
        .headers()?
        .iter()
        .map(|h| recognized_column(&normalize_header(h)).filter(|c| seen.insert(*c)))
        .collect();

    for required in REQUIRED_COLUMNS {
        if !columns.contains(&Some(required)) {
            return Err(ImportError::MissingColumn {
                column: required.to_string(),
            });
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(rows.len() + 2);

        let mut row = AssetRow::new(line);
        for (column, value) in columns.iter().zip(record.iter()) {
            if let Some(column) = column {
                row.set(column, normalize_value(value));
            }
        }

        if !row.is_blank() {
            rows.push(row);
        }
    }

    tracing::debug!(rows = rows.len(), "Read upload rows from CSV");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" Parent ID "), "parent_id");
        assert_eq!(normalize_header("Serial-Number"), "serial_number");
        assert_eq!(normalize_header("\u{feff}id"), "id");
        assert_eq!(
            normalize_header("Functional Location Long Desc"),
            "functional_location_long_desc"
        );
    }

    #[test]
    fn test_normalize_value() {
        assert_eq!(normalize_value("  Pump  "), Some("Pump".to_string()));
        assert_eq!(normalize_value("   "), None);
        assert_eq!(normalize_value(""), None);
    }

    #[test]
    fn test_normalized_clears_blank_values() {
        let row: AssetRow = serde_json::from_str(
            r#"{"row_number": 7, "id": "  E1 ", "name": "   ", "parent_id": "", "make": "Acme"}"#,
        )
        .unwrap();

        let clean = row.normalized();
        assert_eq!(clean.row_number, 7);
        assert_eq!(clean.id.as_deref(), Some("E1"));
        assert_eq!(clean.name, None);
        assert_eq!(clean.parent_id, None);
        assert_eq!(clean.make.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_builder_trims_and_ignores_unknown() {
        let row = AssetRow::new(4)
            .with_id(" E1 ")
            .with_name("Pump")
            .with("manufacturer", " Acme ")
            .with("colour", "red");

        assert_eq!(row.id.as_deref(), Some("E1"));
        assert_eq!(row.manufacturer.as_deref(), Some("Acme"));
        assert!(!AssetRow::new(4).set("colour", None));
    }

    #[test]
    fn test_read_rows_maps_columns_and_line_numbers() {
        let csv = "\
ID,Name,Description,Parent ID,Colour
P1,Plant,Main plant,,red

A1, Area ,,P1,blue
";
        let rows = read_csv_rows(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].description.as_deref(), Some("Main plant"));
        assert_eq!(rows[0].parent_id, None);
        assert_eq!(rows[1].row_number, 4);
        assert_eq!(rows[1].name.as_deref(), Some("Area"));
        assert_eq!(rows[1].parent_id.as_deref(), Some("P1"));
    }

    #[test]
    fn test_rows_of_empty_cells_are_skipped() {
        let csv = "id,name\nP1,Plant\n,\n  ,  \nA1,Area\n";
        let rows = read_csv_rows(csv.as_bytes()).unwrap();

        let ids: Vec<_> = rows.iter().map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, vec![Some("P1"), Some("A1")]);
        assert_eq!(rows[1].row_number, 5);
    }

    #[test]
    fn test_short_rows_are_accepted() {
        let csv = "id,name,parent_id\nP1,Plant\n";
        let rows = read_csv_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].parent_id, None);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "id,description\nP1,Plant\n";
        let err = read_csv_rows(csv.as_bytes()).unwrap_err();
        match err {
            ImportError::MissingColumn { column } => assert_eq!(column, "name"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_read_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.csv");
        std::fs::write(&path, "id,name\nP1,Plant\n").unwrap();

        let rows = read_csv_file(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name.as_deref(), Some("Plant"));
    }

    #[test]
    fn test_missing_file_is_csv_error() {
        let err = read_csv_file("/nonexistent/assets.csv").unwrap_err();
        assert!(matches!(err, ImportError::Csv(_)));
    }
}
