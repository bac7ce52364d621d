//! Command implementations behind the CLI.
//!
//! Config-driven suite runs go through `crate::engine::Harness`; single calls go
//! straight through the boundary.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::boundary::{Boundary, Callable, RuntimeHandle, RuntimeOptions};
use crate::core::{
    Algorithm, EnvironmentInfo, RunRecord, WorkloadFactory, default_workers, inputs_fingerprint,
};
use crate::engine::{Harness, HarnessConfig};
use crate::report::{format_ms, render_markdown, render_table, write_markdown};
use crate::storage::{CsvExporter, RecordFilter, RecordLog};
use crate::{BenchError, BenchResult};

use super::config::{SuiteConfig, load_suite_config};

const DEFAULT_CONFIG: &str = "bench-config.toml";
const DEFAULT_JSONL: &str = "out/bench.jsonl";
const DEFAULT_CSV: &str = "out/bench.csv";

/// Options of `triad-bench run`. Flags override the suite file.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub algorithms: Vec<Algorithm>,
    pub iterations: Option<usize>,
    pub warmup: Option<usize>,
    pub workers: Option<usize>,
    pub yield_ms: Option<u64>,
    pub jsonl: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub markdown: Option<PathBuf>,
    pub cli_args: Vec<String>,
}

/// Effective settings after merging flags, suite file and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub harness: HarnessConfig,
    pub workers: usize,
    pub algorithms: Vec<Algorithm>,
}

pub fn resolve_settings(args: &RunArgs, cfg: &SuiteConfig) -> Settings {
    let defaults = HarnessConfig::default();
    let run = &cfg.run;
    let algorithms = if !args.algorithms.is_empty() {
        args.algorithms.clone()
    } else {
        run.algorithms
            .clone()
            .unwrap_or_else(|| Algorithm::ALL.to_vec())
    };
    Settings {
        harness: HarnessConfig {
            iterations: args.iterations.or(run.iterations).unwrap_or(defaults.iterations),
            warmup: args.warmup.or(run.warmup).unwrap_or(defaults.warmup),
            yield_between: args
                .yield_ms
                .or(run.yield_ms)
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            variants: run.variants.clone().unwrap_or(defaults.variants),
        },
        workers: args.workers.or(run.workers).unwrap_or_else(default_workers),
        algorithms,
    }
}

fn load_config(path: Option<&Path>) -> BenchResult<(SuiteConfig, Option<PathBuf>)> {
    match path {
        Some(p) => Ok((load_suite_config(p)?, Some(p.to_path_buf()))),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            if default.exists() {
                info!("using {}", default.display());
                Ok((load_suite_config(&default)?, Some(default)))
            } else {
                Ok((SuiteConfig::default(), None))
            }
        }
    }
}

/// Runtime for a command. A runtime that fails to initialize is still returned
/// so the harness can report its entries as not ready.
fn native_runtime(workers: usize) -> RuntimeHandle {
    let mut runtime = RuntimeHandle::new(RuntimeOptions::new(workers));
    if let Err(e) = runtime.initialize() {
        warn!(error = %e, "compiled variants will be reported as not ready");
    }
    runtime
}

/// Run the suite, print the comparison table and write the requested outputs.
pub fn run(args: RunArgs) -> BenchResult<RunRecord> {
    let (cfg, cfg_path) = load_config(args.config.as_deref())?;
    let settings = resolve_settings(&args, &cfg);
    let suite_name = cfg.suite_name(cfg_path.as_deref());

    let runtime = native_runtime(settings.workers);
    let harness = Harness::new(&runtime, settings.harness.clone())?;

    let factory = WorkloadFactory::new(cfg.workloads.clone());
    let workloads = factory.build_all(&settings.algorithms);

    let started = Instant::now();
    let results = harness.run_suite(&workloads);
    info!(suite = %suite_name, elapsed_ms = started.elapsed().as_millis() as u64, "suite finished");

    let mut record = RunRecord::new(suite_name, EnvironmentInfo::detect(), harness.run_config());
    record.inputs_sha256 = Some(inputs_fingerprint(&workloads));
    record.used_memory_bytes = crate::capture_used_memory();
    record.results = results;
    record.cli_args = args.cli_args.clone();

    print!("{}", render_table(&record.results));

    if let Some(path) = &args.jsonl {
        RecordLog::open(path).append(&record)?;
        info!("appended record {} to {}", record.record_id, path.display());
    }
    if let Some(path) = &args.csv {
        CsvExporter::new().export(std::slice::from_ref(&record), path)?;
        info!("wrote {}", path.display());
    }
    if let Some(path) = &args.markdown {
        write_markdown(path, &record)?;
        info!("wrote {}", path.display());
    }

    Ok(record)
}

/// List every callable and whether it needs the compiled runtime.
pub fn list() -> BenchResult<()> {
    for callable in Callable::all() {
        let side = if callable.variant.requires_runtime() {
            "compiled"
        } else {
            "local"
        };
        println!("{:<32} {:<16} {}", callable.name(), callable.algorithm, side);
    }
    Ok(())
}

/// Read a payload argument: inline JSON, or `@path` to read it from a file.
fn read_payload(payload: &str) -> BenchResult<String> {
    match payload.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| BenchError::Message(format!("failed to read payload {path}: {e}"))),
        None => Ok(payload.to_string()),
    }
}

/// Make one boundary call and print a summary of its output.
pub fn call(callable: &str, payload: &str, workers: Option<usize>) -> BenchResult<()> {
    let json = read_payload(payload)?;
    let runtime = native_runtime(workers.unwrap_or_else(default_workers));

    let start = Instant::now();
    let invocation = Boundary::call_json(&runtime, callable, &json)?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    println!("{callable}: {} in {}", invocation.output.summary(), format_ms(elapsed_ms));
    for failure in &invocation.failures {
        println!(
            "  partition {} [{}, {}) failed: {}",
            failure.partition.index, failure.partition.start, failure.partition.end, failure.reason
        );
    }
    invocation.into_result().map(|_| ())
}

/// Options of `triad-bench show`.
#[derive(Debug, Clone, Default)]
pub struct ShowArgs {
    pub jsonl: Option<PathBuf>,
    pub filter: RecordFilter,
    /// Only the newest matching record.
    pub latest: bool,
    pub markdown: bool,
}

/// Render stored run records.
pub fn show(args: ShowArgs) -> BenchResult<()> {
    let jsonl = args.jsonl.unwrap_or_else(|| PathBuf::from(DEFAULT_JSONL));
    let log = RecordLog::open(&jsonl);
    let records: Vec<RunRecord> = if args.latest {
        log.latest(&args.filter)?.into_iter().collect()
    } else {
        log.read(&args.filter)?
    };
    if records.is_empty() {
        println!("no matching records in {}", log.path().display());
        return Ok(());
    }
    let markdown = args.markdown;
    for record in &records {
        if markdown {
            println!("{}", render_markdown(record));
        } else {
            println!(
                "{}  {}  suite={} workers={}",
                record.timestamp, record.record_id, record.suite_name, record.config.workers
            );
            println!("{}", render_table(&record.results));
        }
    }
    Ok(())
}

/// Flatten stored run records to CSV.
pub fn export_csv(jsonl_path: Option<PathBuf>, csv_out: Option<PathBuf>) -> BenchResult<()> {
    let jsonl = jsonl_path.unwrap_or_else(|| PathBuf::from(DEFAULT_JSONL));
    let csvp = csv_out.unwrap_or_else(|| PathBuf::from(DEFAULT_CSV));
    let records = RecordLog::open(&jsonl).read(&RecordFilter::default())?;
    CsvExporter::new().export(&records, &csvp)?;
    println!("wrote {} ({} records)", csvp.display(), records.len());
    Ok(())
}
