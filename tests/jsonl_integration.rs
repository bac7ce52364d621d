//! Integration tests for JSONL storage and CSV export of run records.

use triad_bench::core::env::EnvironmentInfo;
use triad_bench::core::schema::{
    Algorithm, ComparisonResult, EntryStatus, RunConfig, RunRecord, TimingStat, Variant,
    VariantResult,
};
use triad_bench::storage::{CSV_HEADERS, CsvExporter, RecordFilter, RecordLog};

/// Helper to create a test record with a given suite name
fn make_test_record(name: &str) -> RunRecord {
    RunRecord::new(
        name.to_string(),
        EnvironmentInfo::default(),
        RunConfig {
            warmup_iterations: 1,
            measured_iterations: 3,
            workers: 4,
            yield_ms: None,
        },
    )
}

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

fn all_suites() -> RecordFilter {
    RecordFilter::default()
}

#[test]
fn test_log_keeps_append_order_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("bench.jsonl");

    let first = make_test_record("suite_a");
    RecordLog::open(&path).append(&first).unwrap();
    assert_eq!(RecordLog::open(&path).count().unwrap(), 1);

    let log = RecordLog::open(&path);
    log.append(&make_test_record("suite_b")).unwrap();
    log.append(&make_test_record("suite_c")).unwrap();

    let records = log.read(&all_suites()).unwrap();
    let suites: Vec<&str> = records.iter().map(|r| r.suite_name.as_str()).collect();
    assert_eq!(suites, ["suite_a", "suite_b", "suite_c"]);
    assert_eq!(records[0].record_id, first.record_id);
    assert_eq!(records[0].config.workers, 4);
    assert_eq!(log.latest(&all_suites()).unwrap().unwrap().suite_name, "suite_c");
}

#[test]
fn test_read_by_suite_and_latest_of_suite() {
    let dir = tempfile::tempdir().unwrap();
    let log = RecordLog::open(dir.path().join("filtered.jsonl"));

    let mut ids = Vec::new();
    for name in ["alpha", "beta", "alpha", "gamma", "alpha"] {
        let record = make_test_record(name);
        ids.push(record.record_id.clone());
        log.append(&record).unwrap();
    }

    let alpha = log.read(&RecordFilter::suite("alpha")).unwrap();
    assert_eq!(alpha.len(), 3);
    assert!(alpha.iter().all(|r| r.suite_name == "alpha"));
    assert!(log.read(&RecordFilter::suite("nonexistent")).unwrap().is_empty());
    assert_eq!(log.read(&all_suites()).unwrap().len(), 5);

    let newest_beta = log.latest(&RecordFilter::suite("beta")).unwrap().unwrap();
    assert_eq!(newest_beta.record_id, ids[1]);
    assert_eq!(log.latest(&RecordFilter::suite("alpha")).unwrap().unwrap().record_id, ids[4]);
}

#[test]
fn test_read_narrows_results_to_algorithm_and_variant() {
    let dir = tempfile::tempdir().unwrap();
    let log = RecordLog::open(dir.path().join("narrow.jsonl"));

    let mut record = make_test_record("mixed");
    record.results.push(ComparisonResult::new(
        Algorithm::MatrixMultiply,
        "32x32".into(),
        vec![
            measured(Variant::Interpreted, &[80.0]),
            measured(Variant::CompiledSingle, &[4.0]),
            measured(Variant::CompiledParallel, &[1.0]),
        ],
    ));
    record.results.push(ComparisonResult::new(
        Algorithm::HashDiffusion,
        "1024 bytes x 2048".into(),
        vec![measured(Variant::Interpreted, &[30.0]), measured(Variant::CompiledSingle, &[3.0])],
    ));
    log.append(&record).unwrap();
    log.append(&make_test_record("mixed")).unwrap();

    let parallel = log
        .read(&RecordFilter::suite("mixed").with_variant(Variant::CompiledParallel))
        .unwrap();
    assert_eq!(parallel.len(), 1, "records without the variant are dropped");
    assert_eq!(parallel[0].results.len(), 1);
    let only = &parallel[0].results[0];
    assert_eq!(only.algorithm, Algorithm::MatrixMultiply);
    assert_eq!(only.variants.len(), 1);
    assert_eq!(only.variants[0].speedup, Some(80.0));

    let hash = log
        .read(&RecordFilter::default().with_algorithm(Algorithm::HashDiffusion))
        .unwrap();
    assert_eq!(hash[0].results.len(), 1);
    assert_eq!(hash[0].results[0].variants.len(), 2);
}

#[test]
fn test_read_nonexistent_file_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let log = RecordLog::open(dir.path().join("does_not_exist.jsonl"));

    let err = log.read(&all_suites()).unwrap_err();
    assert!(err.to_string().contains("file not found"));
}

#[test]
fn test_results_and_statuses_survive_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.jsonl");
    let log = RecordLog::open(&path);

    let mut record = make_test_record("with_results");
    record.inputs_sha256 = Some("abc123".to_string());
    record.used_memory_bytes = Some(1 << 30);
    record.results.push(ComparisonResult::new(
        Algorithm::Mandelbrot,
        "64x64 max_iter=100".into(),
        vec![
            measured(Variant::Interpreted, &[40.0, 44.0, 42.0]),
            measured(Variant::CompiledSingle, &[4.0, 4.4, 4.2]),
            VariantResult::empty(
                Variant::CompiledParallel,
                EntryStatus::Missing {
                    reason: "not exported".into(),
                },
            ),
        ],
    ));
    log.append(&record).unwrap();

    let loaded = log.latest(&all_suites()).unwrap().unwrap();
    assert_eq!(loaded.inputs_sha256.as_deref(), Some("abc123"));
    assert_eq!(loaded.used_memory_bytes, Some(1 << 30));
    let cmp = &loaded.results[0];
    assert_eq!(cmp.algorithm, Algorithm::Mandelbrot);
    let single = cmp.variant(Variant::CompiledSingle).unwrap();
    assert!((single.speedup.unwrap() - 10.0).abs() < 1e-9);
    assert_eq!(
        cmp.variant(Variant::CompiledParallel).unwrap().status,
        EntryStatus::Missing {
            reason: "not exported".into()
        }
    );
    assert_eq!(cmp.variant(Variant::CompiledParallel).unwrap().speedup, None);
}

#[test]
fn test_export_stored_records_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let log = RecordLog::open(dir.path().join("bench.jsonl"));
    let mut record = make_test_record("csv_suite");
    record.results.push(ComparisonResult::new(
        Algorithm::RayTrace,
        "8x8 samples=1".into(),
        vec![
            measured(Variant::Interpreted, &[9.0]),
            measured(Variant::CompiledParallel, &[1.0]),
        ],
    ));
    log.append(&record).unwrap();
    log.append(&make_test_record("empty_suite")).unwrap();

    let csv_path = dir.path().join("out").join("bench.csv");
    CsvExporter::new()
        .export(&log.read(&all_suites()).unwrap(), &csv_path)
        .unwrap();

    let contents = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].split(',').count(), CSV_HEADERS.len());
    assert!(lines[1].contains("ray_trace"));
    assert!(lines[2].contains("compiled_parallel"));
    assert!(lines[2].ends_with("9.000"));
}
