//! AssetStore implementation for SQLite.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;
use rusqlite::types::Type;
use uuid::Uuid;

use crate::core::{AssetStore, TransactionOptions};
use crate::error::{AssetError, BackendError, StorageError, StorageResult};
use crate::tenant::TenantId;
use crate::types::{AssetFields, StoredAsset};

use super::SqliteBackend;
use super::transaction::SqliteTransaction;

/// Column list shared by every query that materializes a [`StoredAsset`].
pub(super) const ASSET_COLUMNS: &str = "internal_id, tenant_id, external_id, parent_internal_id, \
     name, description, cmms_internal_id, functional_location, functional_location_desc, \
     functional_location_long_desc, maintenance_plant, cmms_system, object_type, system_status, \
     make, manufacturer, serial_number, level, upload_order, created_at, updated_at, deleted_at";

/// Number of entries in [`ASSET_COLUMNS`].
pub(super) const ASSET_COLUMN_COUNT: usize = 22;

pub(super) fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    })
}

pub(super) fn serialization_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::SerializationError { message })
}

/// Formats a timestamp the way it is stored in TEXT columns.
pub(super) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn uuid_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn optional_uuid_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|r| Uuid::parse_str(&r).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn timestamp_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn optional_timestamp_column(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|r| {
        DateTime::parse_from_rfc3339(&r)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

/// Maps a row selected with [`ASSET_COLUMNS`] to a [`StoredAsset`].
pub(super) fn asset_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredAsset> {
    Ok(StoredAsset {
        internal_id: uuid_column(row, 0)?,
        tenant_id: TenantId::new(row.get::<_, String>(1)?),
        external_id: row.get(2)?,
        parent_internal_id: optional_uuid_column(row, 3)?,
        fields: AssetFields {
            name: row.get(4)?,
            description: row.get(5)?,
            cmms_internal_id: row.get(6)?,
            functional_location: row.get(7)?,
            functional_location_desc: row.get(8)?,
            functional_location_long_desc: row.get(9)?,
            maintenance_plant: row.get(10)?,
            cmms_system: row.get(11)?,
            object_type: row.get(12)?,
            system_status: row.get(13)?,
            make: row.get(14)?,
            manufacturer: row.get(15)?,
            serial_number: row.get(16)?,
        },
        level: row.get(17)?,
        upload_order: row.get(18)?,
        created_at: timestamp_column(row, 19)?,
        updated_at: timestamp_column(row, 20)?,
        deleted_at: optional_timestamp_column(row, 21)?,
    })
}

#[async_trait]
impl AssetStore for SqliteBackend {
    type Transaction = SqliteTransaction;

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn begin_transaction(
        &self,
        tenant: &TenantId,
        options: TransactionOptions,
    ) -> StorageResult<Self::Transaction> {
        let conn = self.get_connection()?;
        SqliteTransaction::new(conn, tenant.clone(), options)
    }

    async fn list_assets(
        &self,
        tenant: &TenantId,
        include_deleted: bool,
    ) -> StorageResult<Vec<StoredAsset>> {
        let conn = self.get_connection()?;

        let filter = if include_deleted {
            ""
        } else {
            "AND deleted_at IS NULL"
        };
        let sql = format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE tenant_id = ?1 {filter}
             ORDER BY level, upload_order, external_id"
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| internal_error(format!("Failed to prepare asset listing: {}", e)))?;
        let assets = stmt
            .query_map(params![tenant.as_str()], asset_from_row)
            .map_err(|e| internal_error(format!("Failed to list assets: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| serialization_error(format!("Failed to decode asset row: {}", e)))?;

        Ok(assets)
    }

    async fn count_assets(&self, tenant: &TenantId, include_deleted: bool) -> StorageResult<u64> {
        let conn = self.get_connection()?;

        let sql = if include_deleted {
            "SELECT COUNT(*) FROM assets WHERE tenant_id = ?1"
        } else {
            "SELECT COUNT(*) FROM assets WHERE tenant_id = ?1 AND deleted_at IS NULL"
        };

        let count: i64 = conn
            .query_row(sql, params![tenant.as_str()], |row| row.get(0))
            .map_err(|e| internal_error(format!("Failed to count assets: {}", e)))?;

        Ok(count as u64)
    }

    async fn soft_delete_asset(&self, tenant: &TenantId, external_id: &str) -> StorageResult<()> {
        let conn = self.get_connection()?;
        let now = format_timestamp(Utc::now());

        let rows = conn
            .execute(
                "UPDATE assets SET deleted_at = ?1, updated_at = ?1
                 WHERE tenant_id = ?2 AND external_id = ?3 AND deleted_at IS NULL",
                params![now, tenant.as_str(), external_id],
            )
            .map_err(|e| internal_error(format!("Failed to delete asset: {}", e)))?;

        if rows == 0 {
            return Err(StorageError::Asset(AssetError::ExternalIdNotFound {
                tenant_id: tenant.clone(),
                external_id: external_id.to_string(),
            }));
        }

        tracing::debug!(tenant = %tenant, external_id, "Soft-deleted asset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AssetTransaction;
    use crate::types::NewAsset;

    fn create_test_backend() -> SqliteBackend {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.init_schema().unwrap();
        backend
    }

    fn new_asset(external_id: &str, parent: Option<Uuid>, upload_order: i64) -> NewAsset {
        NewAsset {
            internal_id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            parent_internal_id: parent,
            fields: AssetFields::named(format!("{external_id} name")),
            upload_order,
        }
    }

    async fn seed(backend: &SqliteBackend, tenant: &TenantId, assets: &[NewAsset]) {
        let mut tx = backend
            .begin_transaction(tenant, TransactionOptions::new())
            .await
            .unwrap();
        tx.insert_assets(assets).await.unwrap();
        Box::new(tx).commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_list_assets_orders_by_level_then_upload_order() {
        let backend = create_test_backend();
        let tenant = TenantId::new("acme");

        let root = new_asset("P1", None, 0);
        let second_root = new_asset("P0", None, 2);
        let child = new_asset("A1", Some(root.internal_id), 1);
        seed(&backend, &tenant, &[root.clone(), child.clone(), second_root]).await;

        let mut tx = backend
            .begin_transaction(&tenant, TransactionOptions::new())
            .await
            .unwrap();
        tx.update_levels(1, &[child.internal_id]).await.unwrap();
        Box::new(tx).commit().await.unwrap();

        let listed: Vec<String> = backend
            .list_assets(&tenant, false)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.external_id)
            .collect();
        assert_eq!(listed, vec!["P1", "P0", "A1"]);
    }

    #[tokio::test]
    async fn test_list_assets_round_trips_fields() {
        let backend = create_test_backend();
        let tenant = TenantId::new("acme");

        let mut asset = new_asset("PUMP-1", None, 0);
        asset.fields = AssetFields::named("Feed Pump")
            .with_manufacturer("Acme")
            .with_serial_number("SN-1");
        seed(&backend, &tenant, &[asset.clone()]).await;

        let stored = backend.list_assets(&tenant, false).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].internal_id, asset.internal_id);
        assert_eq!(stored[0].fields, asset.fields);
        assert_eq!(stored[0].tenant_id, tenant);
        assert!(stored[0].is_root());
        assert!(!stored[0].is_deleted());
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let backend = create_test_backend();
        let acme = TenantId::new("acme");
        let globex = TenantId::new("globex");

        seed(&backend, &acme, &[new_asset("A1", None, 0)]).await;
        seed(&backend, &globex, &[new_asset("A1", None, 0), new_asset("B1", None, 1)]).await;

        assert_eq!(backend.count_assets(&acme, false).await.unwrap(), 1);
        assert_eq!(backend.count_assets(&globex, false).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_asset() {
        let backend = create_test_backend();
        let tenant = TenantId::new("acme");
        seed(&backend, &tenant, &[new_asset("A1", None, 0), new_asset("A2", None, 1)]).await;

        backend.soft_delete_asset(&tenant, "A1").await.unwrap();

        assert_eq!(backend.count_assets(&tenant, false).await.unwrap(), 1);
        assert_eq!(backend.count_assets(&tenant, true).await.unwrap(), 2);

        let all = backend.list_assets(&tenant, true).await.unwrap();
        let deleted = all.iter().find(|a| a.external_id == "A1").unwrap();
        assert!(deleted.is_deleted());
    }

    #[tokio::test]
    async fn test_soft_delete_unknown_asset() {
        let backend = create_test_backend();
        let tenant = TenantId::new("acme");

        let result = backend.soft_delete_asset(&tenant, "MISSING").await;
        assert!(matches!(
            result,
            Err(StorageError::Asset(AssetError::ExternalIdNotFound { .. }))
        ));
    }
}
