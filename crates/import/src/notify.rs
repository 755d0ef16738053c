//! Upload notifications.
//!
//! The uploader reports every finished upload to an [`UploadNotifier`]
//! after its transaction has been committed or rolled back. Delivery runs
//! on a spawned task; a failing notifier is logged and never affects the
//! upload result.

use arbor_persistence::tenant::TenantId;
use async_trait::async_trait;
use serde::Serialize;

use crate::error::NotifyError;
use crate::uploader::UploadSummary;

/// What happened to an upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum UploadEvent {
    /// The upload was applied and committed.
    Completed {
        /// Tenant the upload belongs to.
        tenant: TenantId,
        /// Counts and timing.
        summary: UploadSummary,
    },
    /// The upload failed and was rolled back.
    Failed {
        /// Tenant the upload belongs to.
        tenant: TenantId,
        /// Description of the failure.
        message: String,
    },
    /// Validation rejected the upload; nothing was written.
    #[serde(rename_all = "camelCase")]
    Rejected {
        /// Tenant the upload belongs to.
        tenant: TenantId,
        /// Number of validation errors.
        error_count: usize,
    },
}

impl UploadEvent {
    /// Tenant the event belongs to.
    pub fn tenant(&self) -> &TenantId {
        match self {
            UploadEvent::Completed { tenant, .. }
            | UploadEvent::Failed { tenant, .. }
            | UploadEvent::Rejected { tenant, .. } => tenant,
        }
    }
}

/// Receives upload outcomes.
#[async_trait]
pub trait UploadNotifier: Send + Sync {
    /// Delivers one event.
    async fn notify(&self, event: &UploadEvent) -> Result<(), NotifyError>;
}

/// Writes upload events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl UploadNotifier for LogNotifier {
    async fn notify(&self, event: &UploadEvent) -> Result<(), NotifyError> {
        match event {
            UploadEvent::Completed { tenant, summary } => tracing::info!(
                tenant = %tenant,
                created = summary.created_count,
                updated = summary.updated_count,
                unchanged = summary.unchanged_count,
                "Asset upload completed"
            ),
            UploadEvent::Failed { tenant, message } => {
                tracing::warn!(tenant = %tenant, error = %message, "Asset upload failed")
            }
            UploadEvent::Rejected {
                tenant,
                error_count,
            } => tracing::info!(tenant = %tenant, errors = error_count, "Asset upload rejected"),
        }
        Ok(())
    }
}
