//! SQLite schema definitions and migrations.

use rusqlite::Connection;

use crate::error::{BackendError, StorageError, StorageResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

fn migration_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::MigrationError { message })
}

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        // Fresh database
        create_schema_v1(conn)?;
        set_schema_version(conn, 1)?;
        migrate_schema(conn, 1)?;
    } else if current_version < SCHEMA_VERSION {
        migrate_schema(conn, current_version)?;
    }

    Ok(())
}

/// Reads the installed schema version without touching the database.
///
/// Returns `None` if the schema has never been initialized.
pub fn installed_version(conn: &Connection) -> StorageResult<Option<i32>> {
    let has_table: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
            [],
            |row| row.get(0),
        )
        .map_err(|e| migration_error(format!("Failed to inspect schema: {}", e)))?;
    if !has_table {
        return Ok(None);
    }

    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .map_err(|e| migration_error(format!("Failed to read schema_version: {}", e)))
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> StorageResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| migration_error(format!("Failed to create schema_version table: {}", e)))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> StorageResult<()> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| migration_error(format!("Failed to clear schema_version: {}", e)))?;

    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )
    .map_err(|e| migration_error(format!("Failed to set schema_version: {}", e)))?;

    Ok(())
}

/// Create the initial schema (version 1).
fn create_schema_v1(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS assets (
            internal_id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            external_id TEXT NOT NULL,
            parent_internal_id TEXT REFERENCES assets(internal_id),
            name TEXT NOT NULL,
            description TEXT,
            cmms_internal_id TEXT,
            functional_location TEXT,
            functional_location_desc TEXT,
            functional_location_long_desc TEXT,
            maintenance_plant TEXT,
            cmms_system TEXT,
            object_type TEXT,
            system_status TEXT,
            make TEXT,
            manufacturer TEXT,
            serial_number TEXT,
            level INTEGER NOT NULL DEFAULT 0,
            upload_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_assets_active_external_id
            ON assets(tenant_id, external_id) WHERE deleted_at IS NULL;

        CREATE INDEX IF NOT EXISTS idx_assets_tenant_external_id
            ON assets(tenant_id, external_id);
        "#,
    )
    .map_err(|e| migration_error(format!("Failed to create schema v1: {}", e)))?;

    Ok(())
}

/// Run migrations from `from_version` up to [`SCHEMA_VERSION`].
fn migrate_schema(conn: &Connection, from_version: i32) -> StorageResult<()> {
    let mut version = from_version;

    while version < SCHEMA_VERSION {
        match version {
            1 => migrate_v1_to_v2(conn)?,
            other => {
                return Err(migration_error(format!(
                    "No migration path from schema version {}",
                    other
                )));
            }
        }
        version += 1;
        set_schema_version(conn, version)?;
        tracing::debug!(version, "Migrated asset schema");
    }

    Ok(())
}

/// v2: indexes for hierarchy traversal and ordered listing.
fn migrate_v1_to_v2(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_assets_parent
            ON assets(parent_internal_id);

        CREATE INDEX IF NOT EXISTS idx_assets_tenant_level
            ON assets(tenant_id, level, upload_order);
        "#,
    )
    .map_err(|e| migration_error(format!("Failed to migrate schema to v2: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'assets'")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn test_fresh_schema_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);

        let indexes = index_names(&conn);
        assert!(indexes.contains(&"idx_assets_active_external_id".to_string()));
        assert!(indexes.contains(&"idx_assets_parent".to_string()));
    }

    #[test]
    fn test_installed_version_is_read_only() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(installed_version(&conn).unwrap(), None);
        assert_eq!(installed_version(&conn).unwrap(), None);

        initialize_schema(&conn).unwrap();
        assert_eq!(installed_version(&conn).unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_migrates_from_v1() {
        let conn = Connection::open_in_memory().unwrap();
        get_schema_version(&conn).unwrap();
        create_schema_v1(&conn).unwrap();
        set_schema_version(&conn, 1).unwrap();

        initialize_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(index_names(&conn).contains(&"idx_assets_tenant_level".to_string()));
    }

    #[test]
    fn test_active_external_id_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let insert = "INSERT INTO assets (internal_id, tenant_id, external_id, name, created_at, updated_at, deleted_at)
                      VALUES (?1, 't', 'A1', 'Pump', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z', ?2)";

        // Two deleted rows and one active row may share an external id
        conn.execute(insert, rusqlite::params!["1", "2024-01-02T00:00:00Z"])
            .unwrap();
        conn.execute(insert, rusqlite::params!["2", "2024-01-03T00:00:00Z"])
            .unwrap();
        conn.execute(insert, rusqlite::params!["3", Option::<String>::None])
            .unwrap();

        let second_active = conn.execute(insert, rusqlite::params!["4", Option::<String>::None]);
        assert!(second_active.is_err());
    }
}
