//! Per-tenant run artifacts: the flat CSV record and the PDF document.
//!
//! | Artifact | Path |
//! |----------|------|
//! | Flat record | `<raw_data_dir>/<Customer_Name>_<YYYYMMDD>.csv` |
//! | Document | `<reports_dir>/<Customer_Name>_<YYYYMMDD>.pdf` |
//!
//! Both are written to a temporary file inside the target directory and
//! persisted with a rename, so a failed write never leaves a partial file.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use tenantpulse_core::{CanonicalRecord, PipelineError};

use crate::config::OutputSettings;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("customer name {0:?} yields an empty file name")]
    InvalidName(String),

    #[error("could not serialize record: {0}")]
    Serialize(String),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArtifactError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<ArtifactError> for PipelineError {
    fn from(err: ArtifactError) -> Self {
        PipelineError::artifact(err.to_string())
    }
}

/// File stem for a customer's artifacts on `date`.
///
/// Spaces and path separators become `_`.
pub fn file_stem(customer: &str, date: NaiveDate) -> Result<String, ArtifactError> {
    let name: String = customer
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    if name.is_empty() {
        return Err(ArtifactError::InvalidName(customer.to_string()));
    }
    Ok(format!("{name}_{}", date.format("%Y%m%d")))
}

/// Writes run artifacts under the configured output directories.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    reports_dir: PathBuf,
    raw_data_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(reports_dir: impl Into<PathBuf>, raw_data_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            raw_data_dir: raw_data_dir.into(),
        }
    }

    pub fn from_settings(output: &OutputSettings) -> Self {
        Self::new(&output.reports_dir, &output.raw_data_dir)
    }

    /// Persist the record as a one-row CSV (header + values).
    pub fn write_record(
        &self,
        record: &CanonicalRecord,
        date: NaiveDate,
    ) -> Result<PathBuf, ArtifactError> {
        let columns = record
            .flat_columns()
            .map_err(|e| ArtifactError::Serialize(e.to_string()))?;
        let path = self
            .raw_data_dir
            .join(format!("{}.csv", file_stem(&record.customer, date)?));

        let mut csv = csv::Writer::from_writer(Vec::new());
        csv.write_record(columns.iter().map(|(name, _)| name.as_str()))
            .and_then(|_| csv.write_record(columns.iter().map(|(_, value)| value.as_str())))
            .map_err(|e| ArtifactError::Serialize(e.to_string()))?;
        let bytes = csv
            .into_inner()
            .map_err(|e| ArtifactError::Serialize(e.to_string()))?;

        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    /// Persist rendered document bytes.
    pub fn write_document(
        &self,
        customer: &str,
        date: NaiveDate,
        bytes: &[u8],
    ) -> Result<PathBuf, ArtifactError> {
        let path = self
            .reports_dir
            .join(format!("{}.pdf", file_stem(customer, date)?));
        write_atomic(&path, bytes)?;
        Ok(path)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| ArtifactError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ArtifactError::io(dir, e))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| ArtifactError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| ArtifactError::io(path, e.error))?;

    debug!(path = %path.display(), bytes = bytes.len(), "artifact written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tenantpulse_core::{
        LookbackWindow, PlanTier, RawFacts, RawValue, Region, TenantId, TenantIdentity, normalize,
    };

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn record(customer: &str) -> CanonicalRecord {
        let identity = TenantIdentity {
            customer: customer.to_string(),
            tenant_id: TenantId::new(5),
            plan: PlanTier::Enterprise,
            schema_name: Some("tenant_5".to_string()),
            external_crm_id: Some("crm-5".to_string()),
            region: Region::Eu,
        };
        let facts = RawFacts::single_row(
            LookbackWindow::default(),
            [
                ("live_contracts", RawValue::Integer(10)),
                ("owned_live_contracts", RawValue::Integer(4)),
                ("average_contract_value", RawValue::Decimal("12.50".parse().unwrap())),
            ],
        );
        normalize(&identity, &facts).unwrap()
    }

    #[test]
    fn stems_replace_spaces_and_separators() {
        assert_eq!(file_stem("Acme Corp", date()).unwrap(), "Acme_Corp_20261019");
        assert_eq!(file_stem("A/B\\C", date()).unwrap(), "A_B_C_20261019");
        assert!(matches!(file_stem("  ", date()), Err(ArtifactError::InvalidName(_))));
    }

    #[test]
    fn record_csv_has_header_and_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("reports"), dir.path().join("raw"));

        let path = writer.write_record(&record("Acme Corp"), date()).unwrap();
        assert_eq!(path, dir.path().join("raw").join("Acme_Corp_20261019.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 1);

        let value_of = |column: &str| {
            let idx = headers.iter().position(|h| h == column).unwrap();
            rows[0][idx].to_string()
        };
        assert_eq!(value_of("customer"), "Acme Corp");
        assert_eq!(value_of("contracts.average_value"), "12.50");
    }

    #[test]
    fn document_write_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path(), dir.path().join("raw"));

        let path = writer.write_document("Initech", date(), b"%PDF-1.5").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5");

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|name| name != "raw")
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("Initech_20261019.pdf")]);
    }

    #[test]
    fn unwritable_target_is_an_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file, not a directory").unwrap();
        let writer = ArtifactWriter::new(blocker.join("reports"), dir.path());

        let err = writer.write_document("Initech", date(), b"x").unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
        assert!(matches!(PipelineError::from(err), PipelineError::Artifact(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

        #[test]
        fn stems_never_contain_separators(customer in "[A-Za-z0-9 /\\\\.-]{1,40}") {
            if let Ok(stem) = file_stem(&customer, date()) {
                prop_assert!(!stem.contains(' '));
                prop_assert!(!stem.contains('/'));
                prop_assert!(!stem.contains('\\'));
                prop_assert!(stem.ends_with("_20261019"));
            }
        }
    }
}
