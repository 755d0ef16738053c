//! The upload orchestrator.
//!
//! [`AssetUploader`] runs an upload as one unit of work: it loads the
//! tenant's existing assets, validates, classifies, writes new and changed
//! assets in dependency order and recomputes levels, all inside a single
//! store transaction. Any storage failure rolls the whole upload back.
//!
//! ```text
//! fetch existing ─▶ validate ─▶ categorize ─▶ insert new ─▶ update changed ─▶ levels ─▶ commit
//!                      │
//!                      └─ rejected: rollback, return errors
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use arbor_persistence::core::{AssetStore, AssetTransaction, TransactionOptions};
use arbor_persistence::tenant::TenantId;
use arbor_persistence::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::categorize::categorize;
use crate::config::ImportConfig;
use crate::error::{ImportError, ImportResult};
use crate::existing::ExistingState;
use crate::levels::recalculate_levels;
use crate::notify::{LogNotifier, UploadEvent, UploadNotifier};
use crate::record::AssetRecord;
use crate::rows::AssetRow;
use crate::validation::{ValidationResult, validate_rows};
use crate::writer::{insert_new_assets, update_changed_assets};

/// Counts and timing of an applied upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    /// Assets inserted.
    pub created_count: usize,
    /// Assets overwritten, resurrected ones included.
    pub updated_count: usize,
    /// Assets identical to their persisted match.
    pub unchanged_count: usize,
    /// Sum of the three counts.
    pub total_processed: usize,
    /// Wall-clock time of the upload in milliseconds.
    pub processing_time_ms: u64,
}

/// Result of [`AssetUploader::upload`].
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// The upload was applied.
    Completed(UploadSummary),
    /// Validation found problems; nothing was written.
    Rejected(ValidationResult),
}

impl UploadOutcome {
    /// The summary of an applied upload.
    pub fn summary(&self) -> Option<&UploadSummary> {
        match self {
            UploadOutcome::Completed(summary) => Some(summary),
            UploadOutcome::Rejected(_) => None,
        }
    }

    /// The validation result of a rejected upload.
    pub fn rejection(&self) -> Option<&ValidationResult> {
        match self {
            UploadOutcome::Completed(_) => None,
            UploadOutcome::Rejected(result) => Some(result),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct WriteCounts {
    created: usize,
    updated: usize,
    unchanged: usize,
}

/// Applies asset uploads to an [`AssetStore`].
pub struct AssetUploader<S: AssetStore> {
    store: Arc<S>,
    config: ImportConfig,
    notifier: Arc<dyn UploadNotifier>,
}

impl<S: AssetStore> fmt::Debug for AssetUploader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetUploader")
            .field("backend", &self.store.backend_name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: AssetStore> Clone for AssetUploader<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<S: AssetStore> AssetUploader<S> {
    /// Creates an uploader with the default configuration and a
    /// [`LogNotifier`].
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: ImportConfig::default(),
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Replaces the configuration after validating it.
    pub fn with_config(mut self, config: ImportConfig) -> ImportResult<Self> {
        config.ensure_valid()?;
        self.config = config;
        Ok(self)
    }

    /// Replaces the notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn UploadNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The active configuration.
    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Validates `rows` against the tenant's current assets without writing.
    pub async fn validate(
        &self,
        tenant: &TenantId,
        rows: &[AssetRow],
    ) -> ImportResult<ValidationResult> {
        let mut tx = self
            .store
            .begin_transaction(tenant, TransactionOptions::new().read_only())
            .await?;
        let existing = ExistingState::fetch(&mut tx).await?;
        if let Err(err) = Box::new(tx).rollback().await {
            warn!(tenant = %tenant, error = %err, "Failed to close read-only transaction");
        }

        Ok(validate_rows(rows, existing.active_ids(), existing.parent_map()))
    }

    /// Applies already validated records.
    ///
    /// Fetches existing state, classifies, inserts, updates and recomputes
    /// levels in one transaction.
    pub async fn process(
        &self,
        tenant: &TenantId,
        asset_data: Vec<AssetRecord>,
    ) -> ImportResult<UploadSummary> {
        let started = Instant::now();
        let mut tx = self
            .store
            .begin_transaction(tenant, TransactionOptions::new())
            .await?;

        let applied = async {
            let existing = ExistingState::fetch(&mut tx).await?;
            self.apply(&mut tx, &existing, asset_data).await
        }
        .await;

        match applied {
            Ok(counts) => self.commit(tx, tenant, counts, started).await,
            Err(err) => Err(self.abort(tx, tenant, err).await),
        }
    }

    /// Validates and applies `rows` in one transaction.
    pub async fn upload(&self, tenant: &TenantId, rows: &[AssetRow]) -> ImportResult<UploadOutcome> {
        let started = Instant::now();
        let mut tx = self
            .store
            .begin_transaction(tenant, TransactionOptions::new())
            .await?;

        let existing = match ExistingState::fetch(&mut tx).await {
            Ok(existing) => existing,
            Err(err) => return Err(self.abort(tx, tenant, err).await),
        };

        let validation = validate_rows(rows, existing.active_ids(), existing.parent_map());
        if !validation.valid {
            if let Err(err) = Box::new(tx).rollback().await {
                warn!(tenant = %tenant, error = %err, "Failed to roll back rejected upload");
            }
            info!(
                tenant = %tenant,
                rows = rows.len(),
                errors = validation.errors.len(),
                "Asset upload rejected by validation"
            );
            self.notify(UploadEvent::Rejected {
                tenant: tenant.clone(),
                error_count: validation.errors.len(),
            });
            return Ok(UploadOutcome::Rejected(validation));
        }

        match self.apply(&mut tx, &existing, validation.asset_data).await {
            Ok(counts) => self
                .commit(tx, tenant, counts, started)
                .await
                .map(UploadOutcome::Completed),
            Err(err) => Err(self.abort(tx, tenant, err).await),
        }
    }

    async fn apply(
        &self,
        tx: &mut S::Transaction,
        existing: &ExistingState,
        asset_data: Vec<AssetRecord>,
    ) -> StorageResult<WriteCounts> {
        let categorized = categorize(asset_data, existing);
        let counts = WriteCounts {
            created: categorized.new_assets.len(),
            updated: categorized.changed_assets.len(),
            unchanged: categorized.unchanged_count,
        };
        debug!(
            tenant = %tx.tenant(),
            new = counts.created,
            changed = counts.updated,
            unchanged = counts.unchanged,
            "Categorized upload"
        );

        let new_keys = insert_new_assets(
            tx,
            categorized.new_assets,
            existing,
            self.config.insert_chunk_size,
        )
        .await?;
        update_changed_assets(
            tx,
            categorized.changed_assets,
            existing,
            &new_keys,
            self.config.update_chunk_size,
        )
        .await?;

        if counts.created + counts.updated > 0 {
            recalculate_levels(tx).await?;
        }

        Ok(counts)
    }

    async fn commit(
        &self,
        tx: S::Transaction,
        tenant: &TenantId,
        counts: WriteCounts,
        started: Instant,
    ) -> ImportResult<UploadSummary> {
        if let Err(err) = Box::new(tx).commit().await {
            return Err(self.fail(tenant, err));
        }

        let summary = UploadSummary {
            created_count: counts.created,
            updated_count: counts.updated,
            unchanged_count: counts.unchanged,
            total_processed: counts.created + counts.updated + counts.unchanged,
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            tenant = %tenant,
            created = summary.created_count,
            updated = summary.updated_count,
            unchanged = summary.unchanged_count,
            elapsed_ms = summary.processing_time_ms,
            "Asset upload committed"
        );
        self.notify(UploadEvent::Completed {
            tenant: tenant.clone(),
            summary,
        });

        Ok(summary)
    }

    async fn abort(&self, tx: S::Transaction, tenant: &TenantId, err: StorageError) -> ImportError {
        if let Err(rollback_err) = Box::new(tx).rollback().await {
            warn!(tenant = %tenant, error = %rollback_err, "Rollback after failed upload failed");
        }
        self.fail(tenant, err)
    }

    fn fail(&self, tenant: &TenantId, err: StorageError) -> ImportError {
        warn!(tenant = %tenant, error = %err, "Asset upload rolled back");
        self.notify(UploadEvent::Failed {
            tenant: tenant.clone(),
            message: err.to_string(),
        });
        ImportError::processing(err)
    }

    fn notify(&self, event: UploadEvent) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.notify(&event).await {
                warn!(tenant = %event.tenant(), error = %err, "Upload notification failed");
            }
        });
    }
}
