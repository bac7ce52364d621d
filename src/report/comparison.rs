//! Comparison report: rows, terminal table and markdown.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{Algorithm, ComparisonResult, EntryStatus, RunRecord, Variant};

/// One line of the comparison report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub algorithm: Algorithm,
    pub variant: Variant,
    pub mean_time_ms: f64,
    pub speedup_vs_baseline: Option<f64>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stddev_ms: Option<f64>,
    /// Why an entry was not fully measured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ReportRow {
    /// Status label, followed by the detail when there is one.
    pub fn status_text(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{} ({detail})", self.status),
            None => self.status.clone(),
        }
    }
}

/// Flatten comparison results into report rows, in suite order.
pub fn report_rows(results: &[ComparisonResult]) -> Vec<ReportRow> {
    results
        .iter()
        .flat_map(|cmp| {
            cmp.variants.iter().map(|v| ReportRow {
                algorithm: cmp.algorithm,
                variant: v.variant,
                mean_time_ms: v.mean_ms,
                speedup_vs_baseline: v.speedup,
                status: v.status.label().to_string(),
                stddev_ms: v.stat.stddev_ms,
                detail: status_detail(&v.status),
            })
        })
        .collect()
}

/// Format a duration in milliseconds for display.
pub fn format_ms(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2}s", ms / 1000.0)
    } else if ms >= 1.0 {
        format!("{:.2}ms", ms)
    } else {
        format!("{:.3}ms", ms)
    }
}

pub fn format_speedup(speedup: Option<f64>) -> String {
    speedup.map_or_else(|| "-".to_string(), |s| format!("{s:.2}x"))
}

/// Format a byte count for display.
pub fn format_bytes(bytes: u64) -> String {
    let value = bytes as f64;
    if value >= 1_000_000_000.0 {
        format!("{:.1} GB", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.1} MB", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1} KB", value / 1_000.0)
    } else {
        format!("{bytes} B")
    }
}

fn status_detail(status: &EntryStatus) -> Option<String> {
    match status {
        EntryStatus::Ok => None,
        EntryStatus::PartialFailure { failed_iterations } => {
            Some(format!("{failed_iterations} failed"))
        }
        EntryStatus::Missing { reason }
        | EntryStatus::NotReady { reason }
        | EntryStatus::InvalidWorkload { reason } => Some(reason.clone()),
    }
}

/// Plain-text table for the terminal.
pub fn render_table(results: &[ComparisonResult]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<16} {:<18} {:>12} {:>10} {:>10}  {}\n",
        "algorithm", "variant", "mean", "stddev", "speedup", "status"
    ));
    out.push_str(&format!("{}\n", "-".repeat(80)));
    for row in report_rows(results) {
        out.push_str(&format!(
            "{:<16} {:<18} {:>12} {:>10} {:>10}  {}\n",
            row.algorithm.as_str(),
            row.variant.as_str(),
            format_ms(row.mean_time_ms),
            row.stddev_ms.map(format_ms).unwrap_or_else(|| "-".into()),
            format_speedup(row.speedup_vs_baseline),
            row.status_text()
        ));
    }
    out
}

/// Markdown report for one run record.
pub fn render_markdown(record: &RunRecord) -> String {
    let mut out = String::new();

    out.push_str(&format!("## triad-bench: {}\n\n", record.suite_name));

    let generated = record.timestamp.get(..19).unwrap_or(&record.timestamp);
    out.push_str(&format!(
        "| | |\n|---|---|\n\
         | **Record** | `{}` |\n\
         | **Generated** | {} |\n\
         | **CPU** | {} ({}, {} threads) |\n\
         | **Workers** | {} |\n\
         | **Iterations** | {} (+{} warm-up) |\n",
        record.record_id,
        generated.replace('T', " "),
        record.env.cpu_model.as_deref().unwrap_or("unknown"),
        record.env.platform,
        record.env.parallelism,
        record.config.workers,
        record.config.measured_iterations,
        record.config.warmup_iterations,
    ));
    if let Some(git) = &record.env.git {
        out.push_str(&format!("| **Commit** | `{}` |\n", git.label()));
    }
    if let Some(ram) = record.env.total_ram_bytes {
        out.push_str(&format!("| **Memory** | {} |\n", format_bytes(ram)));
    }
    if let Some(mem) = record.used_memory_bytes {
        out.push_str(&format!("| **Memory in use** | {} |\n", format_bytes(mem)));
    }
    out.push('\n');

    for cmp in &record.results {
        out.push_str(&format!("### {} ({})\n\n", cmp.algorithm, cmp.workload));
        out.push_str("| Variant | Mean | Min | Max | Speedup | Status |\n");
        out.push_str("|---------|------|-----|-----|---------|--------|\n");
        for v in &cmp.variants {
            let measured = v.status.is_measured();
            let cell = |ms: f64| if measured { format_ms(ms) } else { "-".to_string() };
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                v.variant,
                cell(v.mean_ms),
                cell(v.stat.min_ms),
                cell(v.stat.max_ms),
                format_speedup(v.speedup),
                v.status.label()
            ));
        }
        out.push('\n');
    }

    out
}

/// Write the markdown report for `record`, creating parent directories.
pub fn write_markdown(path: &Path, record: &RunRecord) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    std::fs::write(path, render_markdown(record))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EnvironmentInfo, RunConfig, TimingStat, VariantResult};

    fn result(variant: Variant, mean_ms: f64) -> VariantResult {
        VariantResult {
            variant,
            status: EntryStatus::Ok,
            mean_ms,
            stat: TimingStat::from_samples(&[mean_ms]),
            speedup: None,
            samples: Vec::new(),
        }
    }

    fn comparison() -> ComparisonResult {
        ComparisonResult::new(
            Algorithm::MatrixMultiply,
            "64x64".into(),
            vec![
                result(Variant::Interpreted, 800.0),
                result(Variant::CompiledSingle, 20.0),
                VariantResult::empty(
                    Variant::CompiledParallel,
                    EntryStatus::Missing {
                        reason: "not exported".into(),
                    },
                ),
            ],
        )
    }

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(1500.0), "1.50s");
        assert_eq!(format_ms(12.345), "12.35ms");
        assert_eq!(format_ms(0.25), "0.250ms");
    }

    #[test]
    fn test_report_rows_use_external_field_names() {
        let rows = report_rows(&[comparison()]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].speedup_vs_baseline, Some(40.0));
        assert_eq!(rows[2].status, "missing");
        let json = serde_json::to_string(&rows[0]).unwrap();
        assert!(json.contains("\"meanTimeMs\":800.0"));
        assert!(json.contains("\"speedupVsBaseline\":1.0"));
    }

    #[test]
    fn test_render_table_shows_missing_reason() {
        let table = render_table(&[comparison()]);
        assert!(table.contains("compiled_single"));
        assert!(table.contains("40.00x"));
        assert!(table.contains("missing (not exported)"));
    }

    #[test]
    fn test_render_markdown_contains_headers() {
        let mut record = RunRecord::new(
            "default".into(),
            EnvironmentInfo::default(),
            RunConfig::default(),
        );
        record.results.push(comparison());
        let md = render_markdown(&record);
        assert!(md.contains("## triad-bench: default"));
        assert!(md.contains("### matrix_multiply (64x64)"));
        assert!(md.contains("| compiled_parallel | - | - | - | - | missing |"));
    }

    #[test]
    fn test_report_rows_carry_table_columns() {
        let rows = report_rows(&[comparison()]);
        assert_eq!(rows[0].detail, None);
        assert_eq!(rows[0].status_text(), rows[0].status);
        assert_eq!(rows[2].status_text(), "missing (not exported)");
        let json = serde_json::to_string(&rows[2]).unwrap();
        assert!(json.contains("\"detail\":\"not exported\""));
        assert!(!json.contains("stddevMs"));
    }

    #[test]
    fn test_write_markdown_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("run.md");
        let mut record = RunRecord::new(
            "written".into(),
            EnvironmentInfo::default(),
            RunConfig::default(),
        );
        record.results.push(comparison());

        write_markdown(&path, &record).unwrap();
        let md = std::fs::read_to_string(&path).unwrap();
        assert_eq!(md, render_markdown(&record));
    }

    #[test]
    fn test_write_markdown_failure_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "").unwrap();
        let record = RunRecord::new("x".into(), EnvironmentInfo::default(), RunConfig::default());

        let err = write_markdown(&blocker.join("run.md"), &record).unwrap_err();
        assert!(format!("{err:#}").contains("not_a_dir"));
        let err: crate::BenchError = err.into();
        assert!(matches!(err, crate::BenchError::Anyhow(_)));
    }
}
