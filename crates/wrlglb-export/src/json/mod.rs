//! JSON batch reports
//!
//! Writes the per-asset outcomes of a batch run, optionally with summary
//! counts, to a JSON file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::json;
use thiserror::Error;
use wrlglb_core::{ConversionOutcome, ConversionSummary};

/// JSON export errors
#[derive(Error, Debug)]
pub enum JsonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<JsonError> for wrlglb_core::Error {
    fn from(err: JsonError) -> Self {
        match err {
            JsonError::Io(e) => wrlglb_core::Error::Io(e),
            other => wrlglb_core::Error::export_failed(other.to_string()),
        }
    }
}

pub type JsonResult<T> = Result<T, JsonError>;

/// JSON export options
#[derive(Debug, Clone)]
pub struct JsonExportOptions {
    /// Use pretty-print formatting
    pub pretty: bool,

    /// Include summary counts next to the outcome list
    pub include_metadata: bool,
}

impl Default for JsonExportOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            include_metadata: true,
        }
    }
}

/// Batch report exporter
#[derive(Debug, Clone, Default)]
pub struct JsonExporter {
    options: JsonExportOptions,
}

impl JsonExporter {
    /// Create new exporter with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create exporter with custom options
    pub fn with_options(options: JsonExportOptions) -> Self {
        Self { options }
    }

    /// Report value for a set of outcomes
    pub fn report(&self, outcomes: &[ConversionOutcome]) -> JsonResult<serde_json::Value> {
        let outcomes_json = serde_json::to_value(outcomes)?;

        Ok(if self.options.include_metadata {
            let summary = ConversionSummary::from_outcomes(outcomes);
            json!({
                "summary": {
                    "total": summary.total(),
                    "converted": summary.converted,
                    "no_geometry": summary.no_geometry,
                    "failed": summary.failed,
                },
                "outcomes": outcomes_json,
            })
        } else {
            outcomes_json
        })
    }

    /// Write the batch report to `output_path`
    pub fn export_report(&self, outcomes: &[ConversionOutcome], output_path: impl AsRef<Path>) -> JsonResult<()> {
        let value = self.report(outcomes)?;
        self.write_json(&value, output_path)
    }

    /// Write JSON to file
    fn write_json(&self, value: &serde_json::Value, output_path: impl AsRef<Path>) -> JsonResult<()> {
        let file = File::create(output_path)?;
        let mut writer = BufWriter::new(file);

        if self.options.pretty {
            serde_json::to_writer_pretty(&mut writer, value)?;
        } else {
            serde_json::to_writer(&mut writer, value)?;
        }
        writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn outcomes() -> Vec<ConversionOutcome> {
        vec![
            ConversionOutcome::Converted {
                name: "Corner".into(),
                output: PathBuf::from("out/Corner.glb"),
                vertex_count: 8,
                triangle_count: 12,
                bytes: 1024,
                fallback: false,
            },
            ConversionOutcome::NoGeometry { name: "Empty".into() },
        ]
    }

    #[test]
    fn test_report_with_summary() {
        let report = JsonExporter::new().report(&outcomes()).unwrap();

        assert_eq!(report["summary"]["total"], 2);
        assert_eq!(report["summary"]["converted"], 1);
        assert_eq!(report["summary"]["no_geometry"], 1);
        assert_eq!(report["outcomes"][0]["status"], "converted");
        assert_eq!(report["outcomes"][1]["status"], "no_geometry");
        assert_eq!(report["outcomes"][1]["name"], "Empty");
    }

    #[test]
    fn test_report_without_metadata() {
        let exporter = JsonExporter::with_options(JsonExportOptions {
            pretty: false,
            include_metadata: false,
        });
        let report = exporter.report(&outcomes()).unwrap();
        assert!(report.is_array());
        assert_eq!(report.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_export_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        JsonExporter::new().export_report(&outcomes(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["summary"]["failed"], 0);
    }
}
