//! Run record schema v1 - canonical schema for all benchmark outputs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::env::EnvironmentInfo;
use crate::BenchError;

/// Schema version for forward compatibility
pub const SCHEMA_VERSION: u32 = 1;

/// The four benchmarked algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    MatrixMultiply,
    Mandelbrot,
    HashDiffusion,
    RayTrace,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::MatrixMultiply,
        Algorithm::Mandelbrot,
        Algorithm::HashDiffusion,
        Algorithm::RayTrace,
    ];

    /// Snake-case name used in configs, records and CSV.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::MatrixMultiply => "matrix_multiply",
            Algorithm::Mandelbrot => "mandelbrot",
            Algorithm::HashDiffusion => "hash_diffusion",
            Algorithm::RayTrace => "ray_trace",
        }
    }

    /// Prefix of the externally visible callable names.
    pub fn callable_prefix(&self) -> &'static str {
        match self {
            Algorithm::MatrixMultiply => "matrixMultiply",
            Algorithm::Mandelbrot => "mandelbrot",
            Algorithm::HashDiffusion => "hashDiffusion",
            Algorithm::RayTrace => "rayTrace",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.as_str() == s || a.callable_prefix() == s)
            .ok_or_else(|| BenchError::Message(format!("unknown algorithm '{s}'")))
    }
}

/// Execution mode of a benchmark entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Single-threaded, evaluated by the expression interpreter. The baseline.
    Interpreted,
    /// Single-threaded native kernel behind the runtime boundary.
    CompiledSingle,
    /// Native kernel replicated over the worker pool.
    CompiledParallel,
}

impl Variant {
    pub const ALL: [Variant; 3] = [
        Variant::Interpreted,
        Variant::CompiledSingle,
        Variant::CompiledParallel,
    ];

    pub const BASELINE: Variant = Variant::Interpreted;

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Interpreted => "interpreted",
            Variant::CompiledSingle => "compiled_single",
            Variant::CompiledParallel => "compiled_parallel",
        }
    }

    pub fn callable_suffix(&self) -> &'static str {
        match self {
            Variant::Interpreted => "Interpreted",
            Variant::CompiledSingle => "CompiledSingle",
            Variant::CompiledParallel => "CompiledParallel",
        }
    }

    /// Whether calls in this variant cross into the compiled runtime.
    pub fn requires_runtime(&self) -> bool {
        !matches!(self, Variant::Interpreted)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.as_str() == s || v.callable_suffix() == s)
            .ok_or_else(|| BenchError::Message(format!("unknown variant '{s}'")))
    }
}

/// One timed iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSample {
    pub algorithm: Algorithm,
    pub variant: Variant,
    pub iteration: u32,
    pub elapsed_ms: f64,
    /// False when the call failed (zero-time sample) or a partition failed.
    pub ok: bool,
}

/// Timing statistics for a benchmark entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingStat {
    pub iterations: u32,
    pub mean_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stddev_ms: Option<f64>,
    pub min_ms: f64,
    pub max_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p95_ms: Option<f64>,
}

impl TimingStat {
    /// Create TimingStat from a slice of sample times in milliseconds
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return TimingStat {
                iterations: 0,
                mean_ms: 0.0,
                median_ms: None,
                stddev_ms: None,
                min_ms: 0.0,
                max_ms: 0.0,
                p95_ms: None,
            };
        }

        let iterations = n as u32;
        let sum: f64 = samples.iter().sum();
        let mean_ms = sum / n as f64;

        let min_ms = samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_ms = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let variance: f64 = samples.iter().map(|x| (x - mean_ms).powi(2)).sum::<f64>() / n as f64;
        let stddev_ms = Some(variance.sqrt());

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let median_ms = if n % 2 == 0 {
            Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
        } else {
            Some(sorted[n / 2])
        };

        // p95: index = ceil(0.95 * n) - 1, clamped
        let p95_idx = ((0.95 * n as f64).ceil() as usize)
            .saturating_sub(1)
            .min(n - 1);
        let p95_ms = Some(sorted[p95_idx]);

        TimingStat {
            iterations,
            mean_ms,
            median_ms,
            stddev_ms,
            min_ms,
            max_ms,
            p95_ms,
        }
    }
}

/// Outcome of one (algorithm, variant) entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryStatus {
    Ok,
    /// Some iterations failed or had failing partitions; the run still completed.
    PartialFailure { failed_iterations: u32 },
    /// The runtime does not export this callable.
    Missing { reason: String },
    /// The runtime was not initialized when the entry started.
    NotReady { reason: String },
    /// Setup rejected the workload.
    InvalidWorkload { reason: String },
}

impl EntryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EntryStatus::Ok => "ok",
            EntryStatus::PartialFailure { .. } => "partial",
            EntryStatus::Missing { .. } => "missing",
            EntryStatus::NotReady { .. } => "not_ready",
            EntryStatus::InvalidWorkload { .. } => "invalid",
        }
    }

    /// Whether the entry produced real measurements.
    pub fn is_measured(&self) -> bool {
        matches!(self, EntryStatus::Ok | EntryStatus::PartialFailure { .. })
    }
}

/// Aggregated measurements for one variant of one algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantResult {
    pub variant: Variant,
    pub status: EntryStatus,
    pub mean_ms: f64,
    pub stat: TimingStat,
    /// `mean(baseline) / mean(self)`; `None` when undefined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speedup: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<TimingSample>,
}

impl VariantResult {
    /// Zero-result entry for a variant that never ran.
    pub fn empty(variant: Variant, status: EntryStatus) -> Self {
        VariantResult {
            variant,
            status,
            mean_ms: 0.0,
            stat: TimingStat::from_samples(&[]),
            speedup: None,
            samples: Vec::new(),
        }
    }
}

/// Per-algorithm comparison of all variants against the baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub algorithm: Algorithm,
    /// Short human description of the workload parameters.
    pub workload: String,
    pub variants: Vec<VariantResult>,
}

impl ComparisonResult {
    /// Build the comparison, filling in speedups relative to the baseline mean.
    pub fn new(algorithm: Algorithm, workload: String, mut variants: Vec<VariantResult>) -> Self {
        let baseline_mean = variants
            .iter()
            .find(|r| r.variant == Variant::BASELINE && r.status.is_measured())
            .map(|r| r.mean_ms);
        for r in &mut variants {
            r.speedup = match baseline_mean {
                Some(base) => speedup(base, r.mean_ms),
                None => None,
            };
        }
        ComparisonResult {
            algorithm,
            workload,
            variants,
        }
    }

    pub fn variant(&self, variant: Variant) -> Option<&VariantResult> {
        self.variants.iter().find(|r| r.variant == variant)
    }
}

/// `baseline / variant`, undefined when either side is not a positive time.
pub fn speedup(baseline_ms: f64, variant_ms: f64) -> Option<f64> {
    if baseline_ms > 0.0 && variant_ms > 0.0 {
        Some(baseline_ms / variant_ms)
    } else {
        None
    }
}

/// Run configuration for benchmarks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub warmup_iterations: u32,
    pub measured_iterations: u32,
    pub workers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_ms: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            warmup_iterations: 1,
            measured_iterations: 5,
            workers: 1,
            yield_ms: None,
        }
    }
}

/// Canonical run record - one line per suite run in JSONL storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Schema version for forward compatibility
    pub schema_version: u32,

    /// Unique identifier for this record
    pub record_id: String,

    /// ISO 8601 timestamp
    pub timestamp: String,

    /// Suite name (config file stem or "default")
    pub suite_name: String,

    /// Environment information (CPU, OS, git, etc.)
    pub env: EnvironmentInfo,

    /// Run configuration
    pub config: RunConfig,

    /// Fingerprint of the generated inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs_sha256: Option<String>,

    /// Host memory in use after the run, in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_memory_bytes: Option<u64>,

    pub results: Vec<ComparisonResult>,

    /// Command line arguments used
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cli_args: Vec<String>,
}

impl RunRecord {
    /// Create a new RunRecord with required fields
    pub fn new(suite_name: String, env: EnvironmentInfo, config: RunConfig) -> Self {
        let timestamp = crate::now_string();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let compact: String = timestamp
            .chars()
            .take(19)
            .filter(|c| !matches!(c, ':' | '-' | 'T'))
            .collect();
        let record_id = format!("{nanos:x}-{compact}");

        RunRecord {
            schema_version: SCHEMA_VERSION,
            record_id,
            timestamp,
            suite_name,
            env,
            config,
            inputs_sha256: None,
            used_memory_bytes: None,
            results: Vec::new(),
            cli_args: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_stat_from_samples() {
        let samples = vec![100.0, 110.0, 105.0, 115.0, 120.0];
        let stat = TimingStat::from_samples(&samples);

        assert_eq!(stat.iterations, 5);
        assert!((stat.mean_ms - 110.0).abs() < 0.001);
        assert_eq!(stat.min_ms, 100.0);
        assert_eq!(stat.max_ms, 120.0);
        assert_eq!(stat.median_ms, Some(110.0));
        assert!((stat.stddev_ms.unwrap() - 7.071).abs() < 0.01);
        assert_eq!(stat.p95_ms, Some(120.0));
    }

    #[test]
    fn test_timing_stat_empty_samples() {
        let stat = TimingStat::from_samples(&[]);

        assert_eq!(stat.iterations, 0);
        assert_eq!(stat.mean_ms, 0.0);
        assert!(stat.median_ms.is_none());
    }

    #[test]
    fn test_speedup_against_baseline() {
        let mk = |variant, mean_ms| VariantResult {
            variant,
            status: EntryStatus::Ok,
            mean_ms,
            stat: TimingStat::from_samples(&[mean_ms]),
            speedup: None,
            samples: Vec::new(),
        };
        let cmp = ComparisonResult::new(
            Algorithm::Mandelbrot,
            "w".into(),
            vec![
                mk(Variant::Interpreted, 100.0),
                mk(Variant::CompiledSingle, 25.0),
                mk(Variant::CompiledParallel, 5.0),
            ],
        );
        assert_eq!(cmp.variant(Variant::Interpreted).unwrap().speedup, Some(1.0));
        assert_eq!(cmp.variant(Variant::CompiledSingle).unwrap().speedup, Some(4.0));
        assert_eq!(cmp.variant(Variant::CompiledParallel).unwrap().speedup, Some(20.0));
    }

    #[test]
    fn test_speedup_undefined_for_missing_entries() {
        let cmp = ComparisonResult::new(
            Algorithm::RayTrace,
            "w".into(),
            vec![
                VariantResult::empty(
                    Variant::Interpreted,
                    EntryStatus::InvalidWorkload { reason: "x".into() },
                ),
                VariantResult::empty(
                    Variant::CompiledSingle,
                    EntryStatus::Missing { reason: "y".into() },
                ),
            ],
        );
        assert!(cmp.variants.iter().all(|v| v.speedup.is_none()));
        assert_eq!(speedup(10.0, 0.0), None);
    }

    #[test]
    fn test_algorithm_parse_accepts_both_spellings() {
        assert_eq!("ray_trace".parse::<Algorithm>().unwrap(), Algorithm::RayTrace);
        assert_eq!("hashDiffusion".parse::<Algorithm>().unwrap(), Algorithm::HashDiffusion);
        assert!("bogus".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_variant_parse_accepts_both_spellings() {
        assert_eq!("compiled_single".parse::<Variant>().unwrap(), Variant::CompiledSingle);
        assert_eq!("CompiledParallel".parse::<Variant>().unwrap(), Variant::CompiledParallel);
        assert!("jit".parse::<Variant>().is_err());
    }
}
