//! JSON export functionality

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use candia_core::AggregateReport;

/// Writes the aggregate report as pretty-printed JSON
pub struct JsonExporter;

impl JsonExporter {
    /// Export the report to a JSON file
    pub fn export(report: &AggregateReport, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        Self::write(report, &mut writer)?;
        writer.flush()?;

        tracing::debug!(path = %path.display(), "Wrote JSON report");
        Ok(())
    }

    /// Write the report to any writer
    pub fn write(report: &AggregateReport, writer: &mut impl Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, report)?;
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candia_core::{ErrorKind, HostFailure, MetricId, Sample, SampleStore, aggregate};

    fn sample_report() -> AggregateReport {
        let mut store = SampleStore::new();
        store.record(Sample {
            host: 0,
            metric: MetricId::Availability,
            value: 99.5,
        });
        let now = chrono::Utc::now();
        AggregateReport {
            entries: aggregate(&store),
            hosts_total: 2,
            hosts_succeeded: 1,
            failures: vec![HostFailure {
                address: "10.0.0.2".into(),
                kind: ErrorKind::Authentication,
                cause: "authentication failed: Permission denied (publickey)".into(),
            }],
            parse_issues: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        JsonExporter::export(&sample_report(), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["hosts_total"], 2);
        assert_eq!(value["entries"][1]["metric"], "availability");
        assert_eq!(value["entries"][1]["value"], 99.5);
        assert_eq!(value["entries"][1]["samples"], 1);
        assert_eq!(value["entries"][1]["rule"], "average");
        assert_eq!(value["failures"][0]["kind"], "authentication");
    }

    #[test]
    fn test_write_is_pretty() {
        let mut buf = Vec::new();
        JsonExporter::write(&sample_report(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("{\n  \"entries\""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");

        let err = JsonExporter::export(&sample_report(), &path).unwrap_err();
        assert!(err.to_string().contains("failed to create"));
    }
}
