//! Structural validation of upload rows.
//!
//! [`validate_rows`] checks, in order:
//!
//! 1. every row has an identifier, and no identifier appears twice
//! 2. every row has a name
//! 3. every parent reference names an asset in the upload or an active
//!    persisted asset
//! 4. the union of upload and persisted parent links is acyclic (only when
//!    step 3 found nothing)
//!
//! Problems are collected, not thrown. Asset data is produced only when no
//! problem was found.

pub mod cycles;

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::AssetRecord;
use crate::rows::AssetRow;

use cycles::{find_cycles, format_cycle};

/// A problem found in an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// Row the problem belongs to; `None` for problems spanning rows.
    pub row: Option<usize>,
    /// Column the problem concerns.
    pub field: String,
    /// Offending value, if there was one.
    pub value: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl RowError {
    /// A problem tied to one row.
    pub fn at_row(
        row: usize,
        field: &str,
        value: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row: Some(row),
            field: field.to_string(),
            value: value.map(str::to_string),
            message: message.into(),
        }
    }

    /// A problem not tied to a single row.
    pub fn general(field: &str, message: impl Into<String>) -> Self {
        Self {
            row: None,
            field: field.to_string(),
            value: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "Row {} [{}]: {}", row, self.field, self.message),
            None => write!(f, "General [{}]: {}", self.field, self.message),
        }
    }
}

/// Outcome of structural validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the upload can be applied.
    pub valid: bool,
    /// Problems, by row ascending, row-less problems last.
    pub errors: Vec<RowError>,
    /// Records ready for persistence; empty unless `valid`.
    pub asset_data: Vec<AssetRecord>,
}

/// Validates `rows` against the persisted state of the tenant.
///
/// `existing_active_ids` holds the identifiers of active persisted assets;
/// `existing_parent_map` maps active persisted children to their parents.
pub fn validate_rows(
    rows: &[AssetRow],
    existing_active_ids: &HashSet<String>,
    existing_parent_map: &HashMap<String, String>,
) -> ValidationResult {
    let rows: Vec<AssetRow> = rows.iter().map(AssetRow::normalized).collect();
    let rows = rows.as_slice();
    let mut errors = Vec::new();

    check_identifiers(rows, &mut errors);
    check_names(rows, &mut errors);

    let upload_ids: HashSet<&str> = rows.iter().filter_map(|r| r.id.as_deref()).collect();
    let (upload_links, unresolved) =
        resolve_parents(rows, &upload_ids, existing_active_ids, &mut errors);

    if unresolved == 0 {
        check_cycles(rows, &upload_ids, &upload_links, existing_parent_map, &mut errors);
    }

    // Stable: per-row check order is kept
    errors.sort_by_key(|e| (e.row.is_none(), e.row));

    let asset_data = if errors.is_empty() {
        rows.iter()
            .enumerate()
            .filter_map(|(index, row)| AssetRecord::from_row(row, index))
            .collect()
    } else {
        Vec::new()
    };

    tracing::debug!(
        rows = rows.len(),
        errors = errors.len(),
        "Validated upload rows"
    );

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        asset_data,
    }
}

fn check_identifiers(rows: &[AssetRow], errors: &mut Vec<RowError>) {
    let mut occurrences: HashMap<&str, Vec<usize>> = HashMap::new();
    for row in rows {
        if let Some(id) = row.id.as_deref() {
            occurrences.entry(id).or_default().push(row.row_number);
        }
    }

    for row in rows {
        let Some(id) = row.id.as_deref() else {
            errors.push(RowError::at_row(
                row.row_number,
                "id",
                None,
                "Asset ID is required",
            ));
            continue;
        };

        let seen_in = &occurrences[id];
        if seen_in.len() > 1 {
            let others: Vec<String> = seen_in
                .iter()
                .filter(|&&n| n != row.row_number)
                .map(|n| n.to_string())
                .collect();
            errors.push(RowError::at_row(
                row.row_number,
                "id",
                Some(id),
                format!(
                    "Duplicate asset ID \"{}\" (also found in row {})",
                    id,
                    others.join(", ")
                ),
            ));
        }
    }
}

fn check_names(rows: &[AssetRow], errors: &mut Vec<RowError>) {
    for row in rows.iter().filter(|r| r.name.is_none()) {
        errors.push(RowError::at_row(
            row.row_number,
            "name",
            None,
            "Asset name is required",
        ));
    }
}

/// Returns the resolvable child → parent links and the number of
/// unresolved references.
fn resolve_parents<'a>(
    rows: &'a [AssetRow],
    upload_ids: &HashSet<&str>,
    existing_active_ids: &HashSet<String>,
    errors: &mut Vec<RowError>,
) -> (HashMap<&'a str, &'a str>, usize) {
    let mut links = HashMap::new();
    let mut unresolved = 0;

    for row in rows {
        let Some(parent) = row.parent_id.as_deref() else {
            continue;
        };

        if upload_ids.contains(parent) || existing_active_ids.contains(parent) {
            if let Some(id) = row.id.as_deref() {
                links.insert(id, parent);
            }
        } else {
            unresolved += 1;
            errors.push(RowError::at_row(
                row.row_number,
                "parent_id",
                Some(parent),
                format!(
                    "Parent asset \"{}\" not found in upload or existing assets",
                    parent
                ),
            ));
        }
    }

    (links, unresolved)
}

fn check_cycles(
    rows: &[AssetRow],
    upload_ids: &HashSet<&str>,
    upload_links: &HashMap<&str, &str>,
    existing_parent_map: &HashMap<String, String>,
    errors: &mut Vec<RowError>,
) {
    // Persisted links only count for identifiers the upload does not restate
    let mut union: HashMap<&str, &str> = existing_parent_map
        .iter()
        .filter(|(child, _)| !upload_ids.contains(child.as_str()))
        .map(|(child, parent)| (child.as_str(), parent.as_str()))
        .collect();
    union.extend(upload_links.iter().map(|(c, p)| (*c, *p)));

    let starts = rows
        .iter()
        .filter_map(|r| r.id.as_deref())
        .filter(|id| upload_links.contains_key(id));

    for cycle in find_cycles(starts, &union) {
        errors.push(RowError::general(
            "parent_id",
            format!("Circular reference detected: {}", format_cycle(&cycle)),
        ));
    }
}
