//! Error types for the persistence layer.
//!
//! Errors are grouped by category: asset state, transactions and the
//! database backend. Everything is folded into [`StorageError`], which is
//! what every store and transaction method returns.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;
use uuid::Uuid;

use crate::tenant::TenantId;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Asset state errors
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Transaction errors
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to asset state.
#[derive(Error, Debug)]
pub enum AssetError {
    /// No asset with the given internal key exists for the tenant.
    #[error("asset not found: {tenant_id}/{internal_id}")]
    NotFound {
        tenant_id: TenantId,
        internal_id: Uuid,
    },

    /// An active asset with the same external identifier already exists.
    #[error("active asset with external id '{external_id}' already exists in tenant {tenant_id}")]
    DuplicateExternalId {
        tenant_id: TenantId,
        external_id: String,
    },

    /// A parent reference could not be resolved to an internal key.
    #[error("asset '{external_id}' references unknown parent '{parent_external_id}'")]
    UnresolvedParent {
        external_id: String,
        parent_external_id: String,
    },

    /// No active asset with the given external identifier exists.
    #[error("no active asset with external id '{external_id}' in tenant {tenant_id}")]
    ExternalIdNotFound {
        tenant_id: TenantId,
        external_id: String,
    },
}

/// Errors related to transactions.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// Transaction was rolled back.
    #[error("transaction rolled back: {reason}")]
    RolledBack { reason: String },

    /// Transaction is no longer valid (already committed or rolled back).
    #[error("transaction no longer valid")]
    InvalidTransaction,

    /// A write was attempted inside a read-only transaction.
    #[error("cannot {operation} inside a read-only transaction")]
    ReadOnly { operation: String },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// A stored value could not be decoded.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::ConnectionFailed {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_error_display() {
        let err = StorageError::Asset(AssetError::UnresolvedParent {
            external_id: "PUMP-01".to_string(),
            parent_external_id: "AREA-9".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "asset 'PUMP-01' references unknown parent 'AREA-9'"
        );
    }

    #[test]
    fn test_not_found_display() {
        let id = Uuid::nil();
        let err = AssetError::NotFound {
            tenant_id: TenantId::new("acme"),
            internal_id: id,
        };
        assert_eq!(err.to_string(), format!("asset not found: acme/{}", id));
    }

    #[test]
    fn test_transaction_error_display() {
        let err = TransactionError::ReadOnly {
            operation: "insert assets".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot insert assets inside a read-only transaction"
        );
    }

    #[test]
    fn test_storage_error_from_categories() {
        let err: StorageError = TransactionError::InvalidTransaction.into();
        assert!(matches!(err, StorageError::Transaction(_)));

        let err: StorageError = BackendError::QueryError {
            message: "boom".to_string(),
        }
        .into();
        assert!(matches!(err, StorageError::Backend(_)));
        assert_eq!(err.to_string(), "query execution failed: boom");
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_from_rusqlite_keeps_source() {
        use std::error::Error as _;

        let err: StorageError = rusqlite::Error::QueryReturnedNoRows.into();
        match &err {
            StorageError::Backend(backend) => assert!(backend.source().is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
