//! The `validate` and `import` subcommands.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use arbor_import::report::ErrorReport;
use arbor_import::rows::read_csv_file;
use arbor_import::{AssetUploader, UploadOutcome, ValidationResult};
use arbor_persistence::TenantId;
use arbor_persistence::backends::sqlite::SqliteBackend;
use tracing::info;

use crate::config::CliConfig;

/// Opens the configured database and brings its schema up to date.
pub fn open_backend(config: &CliConfig) -> anyhow::Result<SqliteBackend> {
    info!(database = %config.database, "Opening SQLite database");
    let backend = SqliteBackend::open(&config.database)
        .with_context(|| format!("failed to open database '{}'", config.database))?;
    backend.init_schema()?;
    if let Some(version) = backend.health_check()? {
        info!(location = %backend.location(), schema_version = version, "Database ready");
    }
    Ok(backend)
}

/// Checks `file` against the tenant's assets. Returns whether it is valid.
pub async fn validate<W: Write>(
    uploader: &AssetUploader<SqliteBackend>,
    tenant: &TenantId,
    file: &Path,
    out: &mut W,
) -> anyhow::Result<bool> {
    let rows =
        read_csv_file(file).with_context(|| format!("failed to read {}", file.display()))?;
    let result = uploader.validate(tenant, &rows).await?;

    if result.valid {
        writeln!(
            out,
            "{}: {} asset(s) valid for tenant {}",
            file.display(),
            result.asset_data.len(),
            tenant
        )?;
    } else {
        write_rejection(uploader, &result, out)?;
    }
    Ok(result.valid)
}

/// Validates and applies `file`. Returns whether the upload was committed.
pub async fn import<W: Write>(
    uploader: &AssetUploader<SqliteBackend>,
    tenant: &TenantId,
    file: &Path,
    out: &mut W,
) -> anyhow::Result<bool> {
    let rows =
        read_csv_file(file).with_context(|| format!("failed to read {}", file.display()))?;

    match uploader.upload(tenant, &rows).await? {
        UploadOutcome::Completed(summary) => {
            writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
            Ok(true)
        }
        UploadOutcome::Rejected(result) => {
            write_rejection(uploader, &result, out)?;
            Ok(false)
        }
    }
}

fn write_rejection<W: Write>(
    uploader: &AssetUploader<SqliteBackend>,
    result: &ValidationResult,
    out: &mut W,
) -> anyhow::Result<()> {
    writeln!(out, "Upload rejected with {} error(s):", result.errors.len())?;
    writeln!(
        out,
        "{}",
        ErrorReport::with_config(&result.errors, uploader.config())
    )?;
    Ok(())
}

/// Builds an uploader over the configured database.
pub fn create_uploader(config: &CliConfig) -> anyhow::Result<AssetUploader<SqliteBackend>> {
    let backend = open_backend(config)?;
    Ok(AssetUploader::new(Arc::new(backend)).with_config(config.import_config())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_persistence::core::AssetStore;
    use clap::Parser;

    fn config_for(database: &Path, args: &[&str]) -> CliConfig {
        let database = database.to_string_lossy().into_owned();
        let mut argv = vec!["arbor", "--database", database.as_str()];
        argv.extend_from_slice(args);
        CliConfig::try_parse_from(argv).unwrap()
    }

    fn write_csv(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_import_prints_summary() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(
            dir.path(),
            "plant.csv",
            "id,name,parent_id\nP1,Plant,\nA1,Area,P1\nE1,Pump,A1\n",
        );
        let config = config_for(&dir.path().join("arbor.db"), &["import", "plant.csv"]);
        let uploader = create_uploader(&config).unwrap();

        let mut out = Vec::new();
        let committed = import(&uploader, &config.tenant(), &csv, &mut out)
            .await
            .unwrap();
        assert!(committed);

        let printed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed["createdCount"], 3);
        assert_eq!(printed["totalProcessed"], 3);
    }

    #[tokio::test]
    async fn test_validate_prints_report() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(dir.path(), "bad.csv", "id,name,parent_id\nE1,Pump,GHOST\n");
        let config = config_for(&dir.path().join("arbor.db"), &["validate", "bad.csv"]);
        let uploader = create_uploader(&config).unwrap();

        let mut out = Vec::new();
        let valid = validate(&uploader, &config.tenant(), &csv, &mut out)
            .await
            .unwrap();
        assert!(!valid);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Upload rejected with 1 error(s):"));
        assert!(printed.contains("Row 2 [parent_id] \"GHOST\""));
    }

    #[tokio::test]
    async fn test_rejected_import_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(dir.path(), "dup.csv", "id,name\nP1,Plant\nP1,Plant again\n");
        let config = config_for(&dir.path().join("arbor.db"), &["import", "dup.csv"]);
        let uploader = create_uploader(&config).unwrap();

        let mut out = Vec::new();
        let committed = import(&uploader, &config.tenant(), &csv, &mut out)
            .await
            .unwrap();
        assert!(!committed);
        assert_eq!(
            uploader
                .store()
                .count_assets(&config.tenant(), true)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("arbor.db"), &["import", "nope.csv"]);
        let uploader = create_uploader(&config).unwrap();

        let err = import(
            &uploader,
            &config.tenant(),
            &dir.path().join("nope.csv"),
            &mut Vec::new(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
