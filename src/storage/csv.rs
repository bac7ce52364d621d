//! CSV export for run records.
//!
//! One row per (record, algorithm, variant), so spreadsheets can pivot on any
//! of the three.

use std::io::Write;
use std::path::Path;

use crate::BenchError;
use crate::core::schema::{ComparisonResult, RunRecord, VariantResult};

/// CSV column headers in deterministic order.
pub const CSV_HEADERS: &[&str] = &[
    "schema_version",
    "record_id",
    "timestamp",
    "suite_name",
    "git_sha",
    "workers",
    "warmup",
    "iterations",
    "algorithm",
    "workload",
    "variant",
    "status",
    "mean_ms",
    "median_ms",
    "stddev_ms",
    "min_ms",
    "max_ms",
    "speedup",
];

/// CSV exporter for run records.
#[derive(Debug, Clone, Default)]
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        CsvExporter
    }

    /// Export records to a CSV file.
    ///
    /// # Errors
    /// Returns an error if file operations or CSV writing fails.
    pub fn export(&self, records: &[RunRecord], output: &Path) -> Result<(), BenchError> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| BenchError::Message(format!("failed to create directory: {e}")))?;
            }
        }

        let file = std::fs::File::create(output)
            .map_err(|e| BenchError::Message(format!("failed to create file: {e}")))?;

        self.export_to_writer(records, file)
    }

    /// Export records to any writer implementing Write.
    pub fn export_to_writer<W: Write>(
        &self,
        records: &[RunRecord],
        writer: W,
    ) -> Result<(), BenchError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer
            .write_record(CSV_HEADERS)
            .map_err(|e| BenchError::Message(format!("failed to write CSV headers: {e}")))?;

        for record in records {
            for cmp in &record.results {
                for result in &cmp.variants {
                    let row = self.entry_to_row(record, cmp, result);
                    csv_writer
                        .write_record(&row)
                        .map_err(|e| BenchError::Message(format!("failed to write CSV row: {e}")))?;
                }
            }
        }

        csv_writer
            .flush()
            .map_err(|e| BenchError::Message(format!("failed to flush CSV writer: {e}")))?;

        Ok(())
    }

    fn entry_to_row(
        &self,
        record: &RunRecord,
        cmp: &ComparisonResult,
        result: &VariantResult,
    ) -> Vec<String> {
        let measured = result.status.is_measured();
        let ms = |v: f64| {
            if measured {
                format!("{v:.3}")
            } else {
                String::new()
            }
        };
        vec![
            record.schema_version.to_string(),
            record.record_id.clone(),
            record.timestamp.clone(),
            record.suite_name.clone(),
            record.env.git.as_ref().map(|g| g.sha.clone()).unwrap_or_default(),
            record.config.workers.to_string(),
            record.config.warmup_iterations.to_string(),
            record.config.measured_iterations.to_string(),
            cmp.algorithm.to_string(),
            cmp.workload.clone(),
            result.variant.to_string(),
            result.status.label().to_string(),
            ms(result.mean_ms),
            result
                .stat
                .median_ms
                .map(|v| format!("{v:.3}"))
                .unwrap_or_default(),
            result
                .stat
                .stddev_ms
                .map(|v| format!("{v:.3}"))
                .unwrap_or_default(),
            ms(result.stat.min_ms),
            ms(result.stat.max_ms),
            result
                .speedup
                .map(|v| format!("{v:.3}"))
                .unwrap_or_default(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::env::EnvironmentInfo;
    use crate::core::schema::{Algorithm, EntryStatus, RunConfig, TimingStat, Variant};

    fn measured(variant: Variant, samples: &[f64]) -> VariantResult {
        let stat = TimingStat::from_samples(samples);
        VariantResult {
            variant,
            status: EntryStatus::Ok,
            mean_ms: stat.mean_ms,
            stat,
            speedup: None,
            samples: Vec::new(),
        }
    }

    fn make_test_record(name: &str) -> RunRecord {
        let mut record = RunRecord::new(
            name.to_string(),
            EnvironmentInfo::default(),
            RunConfig {
                warmup_iterations: 2,
                measured_iterations: 5,
                workers: 8,
                yield_ms: None,
            },
        );
        record.results.push(ComparisonResult::new(
            Algorithm::HashDiffusion,
            "16 bytes x 2048 iterations".into(),
            vec![
                measured(Variant::Interpreted, &[100.0, 110.0, 105.0]),
                measured(Variant::CompiledSingle, &[10.0, 11.0, 9.0]),
                VariantResult::empty(
                    Variant::CompiledParallel,
                    EntryStatus::NotReady {
                        reason: "uninitialized".into(),
                    },
                ),
            ],
        ));
        record
    }

    #[test]
    fn test_row_length_matches_headers() {
        let exporter = CsvExporter::new();
        let record = make_test_record("suite");
        let cmp = &record.results[0];
        let row = exporter.entry_to_row(&record, cmp, &cmp.variants[0]);
        assert_eq!(row.len(), CSV_HEADERS.len());
    }

    #[test]
    fn test_export_to_writer() {
        let exporter = CsvExporter::new();
        let mut buffer = Vec::new();
        exporter
            .export_to_writer(&[make_test_record("suite")], &mut buffer)
            .unwrap();

        let csv_str = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = csv_str.lines().collect();

        // Header + one row per variant
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("schema_version,record_id,timestamp,suite_name"));
        assert!(lines[1].contains("hash_diffusion"));
        assert!(lines[1].contains("105.000"));
        assert!(lines[2].contains("compiled_single"));
        assert!(lines[2].contains("10.500")); // speedup 105 / 10
        assert!(lines[3].contains("not_ready"));
    }

    #[test]
    fn test_unmeasured_entries_leave_times_empty() {
        let exporter = CsvExporter::new();
        let record = make_test_record("suite");
        let cmp = &record.results[0];
        let row = exporter.entry_to_row(&record, cmp, &cmp.variants[2]);
        // mean_ms, min_ms, max_ms, speedup
        assert_eq!(row[12], "");
        assert_eq!(row[15], "");
        assert_eq!(row[16], "");
        assert_eq!(row[17], "");
    }

    #[test]
    fn test_export_to_file() {
        let exporter = CsvExporter::new();
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("nested").join("out.csv");

        exporter
            .export(&[make_test_record("suite")], &output_path)
            .unwrap();

        let contents = std::fs::read_to_string(&output_path).unwrap();
        assert!(contents.contains("schema_version"));
        assert!(contents.contains("suite"));
    }

    #[test]
    fn test_export_empty_records() {
        let exporter = CsvExporter::new();
        let mut buffer = Vec::new();
        exporter.export_to_writer(&[], &mut buffer).unwrap();
        let csv_str = String::from_utf8(buffer).unwrap();
        assert_eq!(csv_str.lines().count(), 1);
    }
}
