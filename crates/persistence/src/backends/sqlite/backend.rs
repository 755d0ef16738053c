//! Connection pool and database lifecycle for the SQLite asset store.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, StorageError, StorageResult};

use super::schema;

const MEMORY_PATH: &str = ":memory:";

fn connection_failed(err: impl fmt::Display) -> StorageError {
    StorageError::Backend(BackendError::ConnectionFailed {
        backend_name: "sqlite".to_string(),
        message: err.to_string(),
    })
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// A private database that disappears with its connection.
    Memory,
    /// A database file on disk.
    File(PathBuf),
}

impl DatabaseLocation {
    fn from_path(path: &Path) -> Self {
        if path.as_os_str() == MEMORY_PATH {
            DatabaseLocation::Memory
        } else {
            DatabaseLocation::File(path.to_path_buf())
        }
    }

    fn manager(&self) -> SqliteConnectionManager {
        match self {
            DatabaseLocation::Memory => SqliteConnectionManager::memory(),
            DatabaseLocation::File(path) => SqliteConnectionManager::file(path),
        }
    }
}

impl fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseLocation::Memory => f.write_str(MEMORY_PATH),
            DatabaseLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// SQLite asset store.
///
/// Cheap to share behind an `Arc`; every operation checks a connection out
/// of the pool for its own duration.
pub struct SqliteBackend {
    pool: Pool<SqliteConnectionManager>,
    config: SqliteBackendConfig,
    location: DatabaseLocation,
}

impl fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("location", &self.location)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Pool and pragma settings for [`SqliteBackend`].
///
/// Every field is optional when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteBackendConfig {
    /// Upper bound on pooled connections. In-memory databases always use one.
    pub max_connections: u32,
    /// Connections kept open while idle.
    pub min_connections: u32,
    /// How long to wait for a free connection, in milliseconds.
    pub connection_timeout_ms: u64,
    /// How long a statement waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u32,
    /// Switch file databases to write-ahead logging.
    pub enable_wal: bool,
    /// Enforce the parent foreign key.
    pub enable_foreign_keys: bool,
}

impl Default for SqliteBackendConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connection_timeout_ms: 30_000,
            busy_timeout_ms: 5_000,
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

impl SqliteBackendConfig {
    fn build_pool(
        &self,
        location: &DatabaseLocation,
    ) -> StorageResult<Pool<SqliteConnectionManager>> {
        let busy_timeout = Duration::from_millis(u64::from(self.busy_timeout_ms));
        let foreign_keys = self.enable_foreign_keys;
        let manager = location.manager().with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.pragma_update(None, "foreign_keys", foreign_keys)
        });

        let builder = Pool::builder()
            .connection_timeout(Duration::from_millis(self.connection_timeout_ms));

        // A second connection to ":memory:" would see an empty database
        let builder = match location {
            DatabaseLocation::Memory => builder
                .max_size(1)
                .min_idle(Some(1))
                .idle_timeout(None)
                .max_lifetime(None),
            DatabaseLocation::File(_) => builder
                .max_size(self.max_connections)
                .min_idle(Some(self.min_connections.min(self.max_connections))),
        };

        builder.build(manager).map_err(connection_failed)
    }
}

impl SqliteBackend {
    /// Creates a private in-memory store.
    pub fn in_memory() -> StorageResult<Self> {
        Self::with_config(MEMORY_PATH, SqliteBackendConfig::default())
    }

    /// Opens or creates a database file. `":memory:"` opens an in-memory store.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::with_config(path, SqliteBackendConfig::default())
    }

    /// Opens a store with explicit pool settings.
    pub fn with_config<P: AsRef<Path>>(
        path: P,
        config: SqliteBackendConfig,
    ) -> StorageResult<Self> {
        let location = DatabaseLocation::from_path(path.as_ref());
        let pool = config.build_pool(&location)?;
        let backend = Self {
            pool,
            config,
            location,
        };

        if backend.config.enable_wal && backend.location != DatabaseLocation::Memory {
            backend.enable_wal()?;
        }

        tracing::debug!(location = %backend.location, "Opened SQLite asset store");
        Ok(backend)
    }

    /// Creates or migrates the asset schema. Safe to call on every start.
    pub fn init_schema(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        schema::initialize_schema(&conn)
    }

    pub(crate) fn get_connection(
        &self,
    ) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(connection_failed)
    }

    fn enable_wal(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get(0)
        })?;
        tracing::debug!(journal_mode = %mode, "Configured SQLite journal mode");
        Ok(())
    }

    /// Where the database lives.
    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    /// Returns whether this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.location == DatabaseLocation::Memory
    }

    /// Returns the pool settings.
    pub fn config(&self) -> &SqliteBackendConfig {
        &self.config
    }

    /// Checks out a connection and reads the installed schema version.
    ///
    /// Returns `None` for a database whose schema was never initialized.
    pub fn health_check(&self) -> StorageResult<Option<i32>> {
        let conn = self.get_connection()?;
        schema::installed_version(&conn)
    }
}
