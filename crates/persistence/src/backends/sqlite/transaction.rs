//! Transaction support for SQLite backend.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, params, params_from_iter};
use uuid::Uuid;

use crate::core::{AssetTransaction, TransactionOptions};
use crate::error::{AssetError, StorageError, StorageResult, TransactionError};
use crate::tenant::TenantId;
use crate::types::{AssetUpdate, HierarchyLink, NewAsset, StoredAsset};

use super::storage::{
    ASSET_COLUMN_COUNT, ASSET_COLUMNS, asset_from_row, format_timestamp, internal_error,
    serialization_error,
};

/// Upper bound on bound parameters in a single statement.
const MAX_BOUND_PARAMETERS: usize = 32_766;

/// Rows per multi-row INSERT so a statement stays under [`MAX_BOUND_PARAMETERS`].
const MAX_ROWS_PER_INSERT: usize = MAX_BOUND_PARAMETERS / ASSET_COLUMN_COUNT;

/// A SQLite transaction scoped to one tenant.
///
/// Dropping an active transaction rolls it back.
pub struct SqliteTransaction {
    /// The connection used for this transaction.
    conn: Mutex<PooledConnection<SqliteConnectionManager>>,
    /// Whether the transaction is still active.
    active: bool,
    /// Whether writes are rejected.
    read_only: bool,
    /// The tenant this transaction operates on.
    tenant: TenantId,
}

impl std::fmt::Debug for SqliteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTransaction")
            .field("active", &self.active)
            .field("read_only", &self.read_only)
            .field("tenant", &self.tenant)
            .finish()
    }
}

impl SqliteTransaction {
    /// Create a new transaction.
    pub(super) fn new(
        conn: PooledConnection<SqliteConnectionManager>,
        tenant: TenantId,
        options: TransactionOptions,
    ) -> StorageResult<Self> {
        // Writers take the reserved lock up front so they never deadlock on upgrade
        let begin = if options.read_only {
            "BEGIN DEFERRED"
        } else {
            "BEGIN IMMEDIATE"
        };
        conn.execute(begin, []).map_err(|e| {
            StorageError::Transaction(TransactionError::RolledBack {
                reason: format!("Failed to begin transaction: {}", e),
            })
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
            active: true,
            read_only: options.read_only,
            tenant,
        })
    }

    fn ensure_active(&self) -> StorageResult<()> {
        if !self.active {
            return Err(StorageError::Transaction(
                TransactionError::InvalidTransaction,
            ));
        }
        Ok(())
    }

    fn ensure_writable(&self, operation: &str) -> StorageResult<()> {
        self.ensure_active()?;
        if self.read_only {
            return Err(StorageError::Transaction(TransactionError::ReadOnly {
                operation: operation.to_string(),
            }));
        }
        Ok(())
    }
}

fn text(value: &Option<String>) -> Value {
    value.clone().map(Value::Text).unwrap_or(Value::Null)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

/// Finds the external id responsible for a unique violation in `batch`.
fn conflicting_external_id(
    conn: &Connection,
    tenant: &TenantId,
    batch: &[NewAsset],
) -> Option<String> {
    let mut seen = HashSet::new();
    if let Some(repeated) = batch.iter().find(|a| !seen.insert(a.external_id.as_str())) {
        return Some(repeated.external_id.clone());
    }

    batch
        .iter()
        .find(|a| {
            conn.query_row(
                "SELECT 1 FROM assets WHERE tenant_id = ?1 AND external_id = ?2 AND deleted_at IS NULL",
                params![tenant.as_str(), a.external_id],
                |_| Ok(()),
            )
            .is_ok()
        })
        .map(|a| a.external_id.clone())
}

#[async_trait]
impl AssetTransaction for SqliteTransaction {
    async fn find_all_assets(&mut self) -> StorageResult<Vec<StoredAsset>> {
        self.ensure_active()?;

        let conn = self.conn.get_mut();
        let sql = format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE tenant_id = ?1 ORDER BY upload_order, created_at"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| internal_error(format!("Failed to prepare asset query: {}", e)))?;
        let assets = stmt
            .query_map(params![self.tenant.as_str()], asset_from_row)
            .map_err(|e| internal_error(format!("Failed to query assets: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| serialization_error(format!("Failed to decode asset row: {}", e)))?;

        Ok(assets)
    }

    async fn insert_assets(&mut self, assets: &[NewAsset]) -> StorageResult<usize> {
        self.ensure_writable("insert assets")?;
        if assets.is_empty() {
            return Ok(0);
        }

        let now = format_timestamp(Utc::now());
        let conn = self.conn.get_mut();
        let row_placeholder = format!("({})", vec!["?"; ASSET_COLUMN_COUNT].join(", "));
        let mut inserted = 0;

        for batch in assets.chunks(MAX_ROWS_PER_INSERT) {
            let sql = format!(
                "INSERT INTO assets ({ASSET_COLUMNS}) VALUES {}",
                vec![row_placeholder.as_str(); batch.len()].join(", ")
            );

            let mut values: Vec<Value> = Vec::with_capacity(batch.len() * ASSET_COLUMN_COUNT);
            for asset in batch {
                let fields = &asset.fields;
                values.extend([
                    Value::Text(asset.internal_id.to_string()),
                    Value::Text(self.tenant.as_str().to_string()),
                    Value::Text(asset.external_id.clone()),
                    asset
                        .parent_internal_id
                        .map(|p| Value::Text(p.to_string()))
                        .unwrap_or(Value::Null),
                    Value::Text(fields.name.clone()),
                    text(&fields.description),
                    text(&fields.cmms_internal_id),
                    text(&fields.functional_location),
                    text(&fields.functional_location_desc),
                    text(&fields.functional_location_long_desc),
                    text(&fields.maintenance_plant),
                    text(&fields.cmms_system),
                    text(&fields.object_type),
                    text(&fields.system_status),
                    text(&fields.make),
                    text(&fields.manufacturer),
                    text(&fields.serial_number),
                    Value::Integer(0),
                    Value::Integer(asset.upload_order),
                    Value::Text(now.clone()),
                    Value::Text(now.clone()),
                    Value::Null,
                ]);
            }

            match conn.execute(&sql, params_from_iter(values.iter())) {
                Ok(rows) => inserted += rows,
                Err(e) if is_unique_violation(&e) => {
                    let external_id = conflicting_external_id(&**conn, &self.tenant, batch)
                        .unwrap_or_default();
                    return Err(StorageError::Asset(AssetError::DuplicateExternalId {
                        tenant_id: self.tenant.clone(),
                        external_id,
                    }));
                }
                Err(e) => return Err(internal_error(format!("Failed to insert assets: {}", e))),
            }
        }

        tracing::debug!(tenant = %self.tenant, count = inserted, "Inserted assets");
        Ok(inserted)
    }

    async fn update_asset(&mut self, update: &AssetUpdate) -> StorageResult<()> {
        self.ensure_writable("update assets")?;

        let now = format_timestamp(Utc::now());
        let fields = &update.fields;
        let conn = self.conn.get_mut();

        let result = conn.execute(
            "UPDATE assets SET
                parent_internal_id = ?1,
                name = ?2,
                description = ?3,
                cmms_internal_id = ?4,
                functional_location = ?5,
                functional_location_desc = ?6,
                functional_location_long_desc = ?7,
                maintenance_plant = ?8,
                cmms_system = ?9,
                object_type = ?10,
                system_status = ?11,
                make = ?12,
                manufacturer = ?13,
                serial_number = ?14,
                upload_order = ?15,
                updated_at = ?16,
                deleted_at = NULL
             WHERE tenant_id = ?17 AND internal_id = ?18",
            params![
                update.parent_internal_id.map(|p| p.to_string()),
                fields.name,
                fields.description,
                fields.cmms_internal_id,
                fields.functional_location,
                fields.functional_location_desc,
                fields.functional_location_long_desc,
                fields.maintenance_plant,
                fields.cmms_system,
                fields.object_type,
                fields.system_status,
                fields.make,
                fields.manufacturer,
                fields.serial_number,
                update.upload_order,
                now,
                self.tenant.as_str(),
                update.internal_id.to_string(),
            ],
        );

        let rows = match result {
            Ok(rows) => rows,
            Err(e) if is_unique_violation(&e) => {
                return Err(StorageError::Asset(AssetError::DuplicateExternalId {
                    tenant_id: self.tenant.clone(),
                    external_id: update.external_id.clone(),
                }));
            }
            Err(e) => {
                return Err(internal_error(format!(
                    "Failed to update asset {}: {}",
                    update.external_id, e
                )));
            }
        };

        if rows == 0 {
            return Err(StorageError::Asset(AssetError::NotFound {
                tenant_id: self.tenant.clone(),
                internal_id: update.internal_id,
            }));
        }

        Ok(())
    }

    async fn find_hierarchy_links(&mut self) -> StorageResult<Vec<HierarchyLink>> {
        self.ensure_active()?;

        let conn = self.conn.get_mut();
        let mut stmt = conn
            .prepare("SELECT internal_id, parent_internal_id FROM assets WHERE tenant_id = ?1")
            .map_err(|e| internal_error(format!("Failed to prepare link query: {}", e)))?;
        let links = stmt
            .query_map(params![self.tenant.as_str()], |row| {
                let internal_id: String = row.get(0)?;
                let parent: Option<String> = row.get(1)?;
                Ok((internal_id, parent))
            })
            .map_err(|e| internal_error(format!("Failed to query hierarchy links: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read hierarchy link: {}", e)))?;

        links
            .into_iter()
            .map(|(internal_id, parent)| {
                let internal_id = Uuid::parse_str(&internal_id)
                    .map_err(|e| serialization_error(format!("Invalid internal id: {}", e)))?;
                let parent_internal_id = parent
                    .map(|p| Uuid::parse_str(&p))
                    .transpose()
                    .map_err(|e| serialization_error(format!("Invalid parent id: {}", e)))?;
                Ok(HierarchyLink {
                    internal_id,
                    parent_internal_id,
                })
            })
            .collect()
    }

    async fn update_levels(&mut self, level: i32, internal_ids: &[Uuid]) -> StorageResult<usize> {
        self.ensure_writable("update levels")?;
        if internal_ids.is_empty() {
            return Ok(0);
        }

        let conn = self.conn.get_mut();
        let mut updated = 0;

        // Two parameters are taken by the level and the tenant
        for batch in internal_ids.chunks(MAX_BOUND_PARAMETERS - 2) {
            let placeholders = vec!["?"; batch.len()].join(", ");
            let sql = format!(
                "UPDATE assets SET level = ? WHERE tenant_id = ? AND internal_id IN ({placeholders})"
            );

            let mut values = Vec::with_capacity(batch.len() + 2);
            values.push(Value::Integer(i64::from(level)));
            values.push(Value::Text(self.tenant.as_str().to_string()));
            values.extend(batch.iter().map(|id| Value::Text(id.to_string())));

            updated += conn
                .execute(&sql, params_from_iter(values.iter()))
                .map_err(|e| internal_error(format!("Failed to update levels: {}", e)))?;
        }

        Ok(updated)
    }

    async fn commit(mut self: Box<Self>) -> StorageResult<()> {
        self.ensure_active()?;

        self.conn.get_mut().execute("COMMIT", []).map_err(|e| {
            StorageError::Transaction(TransactionError::RolledBack {
                reason: format!("Commit failed: {}", e),
            })
        })?;

        self.active = false;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> StorageResult<()> {
        self.ensure_active()?;

        self.conn.get_mut().execute("ROLLBACK", []).map_err(|e| {
            StorageError::Transaction(TransactionError::RolledBack {
                reason: format!("Rollback failed: {}", e),
            })
        })?;

        self.active = false;
        Ok(())
    }

    fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if self.active {
            let _ = self.conn.get_mut().execute("ROLLBACK", []);
        }
    }
}
