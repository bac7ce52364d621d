//! Benchmark harness: warm-up, timed iterations and aggregation per variant.
//!
//! Each (algorithm, variant) entry moves through
//! `Setup -> WarmUp -> TimedRun -> Aggregate -> Reported`. Nothing that happens
//! inside an entry stops the suite: failures become statuses and zero-time
//! samples.

use std::fmt;
use std::hint::black_box;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, debug_span, info, warn};

use crate::boundary::{Boundary, Callable, Runtime};
use crate::core::{
    ComparisonResult, EntryStatus, RunConfig, TimingSample, TimingStat, Variant, VariantResult,
    WorkloadSpec,
};
use crate::{BenchError, BenchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Setup,
    WarmUp,
    TimedRun,
    Aggregate,
    Reported,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::WarmUp => "warm_up",
            Phase::TimedRun => "timed_run",
            Phase::Aggregate => "aggregate",
            Phase::Reported => "reported",
        };
        f.write_str(name)
    }
}

/// Harness settings.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Timed iterations per entry; at least one.
    pub iterations: usize,
    /// Untimed calls before the timed ones.
    pub warmup: usize,
    /// Pause between timed iterations.
    pub yield_between: Option<Duration>,
    /// Variants to run, always in baseline-first order.
    pub variants: Vec<Variant>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            iterations: 5,
            warmup: 1,
            yield_between: None,
            variants: Variant::ALL.to_vec(),
        }
    }
}

/// Runs benchmark entries against one runtime.
pub struct Harness<'a> {
    runtime: &'a dyn Runtime,
    config: HarnessConfig,
}

/// Maps errors that mean "this entry cannot run at all" to a status.
fn unavailable(err: &BenchError) -> Option<EntryStatus> {
    match err {
        BenchError::NotReady(reason) => Some(EntryStatus::NotReady {
            reason: reason.clone(),
        }),
        BenchError::MissingVariant(reason) => Some(EntryStatus::Missing {
            reason: reason.clone(),
        }),
        _ => None,
    }
}

impl<'a> Harness<'a> {
    pub fn new(runtime: &'a dyn Runtime, config: HarnessConfig) -> BenchResult<Self> {
        if config.iterations == 0 {
            return Err(BenchError::Message("iterations must be at least 1".into()));
        }
        Ok(Harness { runtime, config })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run configuration as stored in run records.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            warmup_iterations: self.config.warmup as u32,
            measured_iterations: self.config.iterations as u32,
            workers: self.runtime.workers(),
            yield_ms: self.config.yield_between.map(|d| d.as_millis() as u64),
        }
    }

    /// Measure one variant of one workload.
    pub fn run_entry(&self, workload: &WorkloadSpec, variant: Variant) -> VariantResult {
        let callable = Callable::new(workload.algorithm(), variant);
        let span = debug_span!("entry", %callable);
        let _guard = span.enter();

        debug!(phase = %Phase::Setup);
        if let Err(e) = workload.validate() {
            warn!(error = %e, "workload rejected");
            return VariantResult::empty(
                variant,
                EntryStatus::InvalidWorkload {
                    reason: e.to_string(),
                },
            );
        }

        let mut first_call = true;

        debug!(phase = %Phase::WarmUp, calls = self.config.warmup);
        for _ in 0..self.config.warmup {
            match Boundary::call_workload(self.runtime, callable, workload) {
                Ok(invocation) => {
                    black_box(invocation);
                }
                Err(e) => {
                    if first_call {
                        if let Some(status) = unavailable(&e) {
                            warn!(status = status.label(), error = %e, "entry skipped");
                            return VariantResult::empty(variant, status);
                        }
                    }
                    warn!(error = %e, "warm-up call failed");
                }
            }
            first_call = false;
        }

        debug!(phase = %Phase::TimedRun, iterations = self.config.iterations);
        let mut samples = Vec::with_capacity(self.config.iterations);
        let mut failed = 0u32;
        for i in 0..self.config.iterations {
            let start = Instant::now();
            let result = Boundary::call_workload(self.runtime, callable, workload);
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

            let (elapsed_ms, ok) = match result {
                Ok(invocation) if invocation.is_complete() => {
                    black_box(invocation);
                    (elapsed_ms, true)
                }
                Ok(invocation) => {
                    warn!(
                        iteration = i,
                        failed_partitions = invocation.failures.len(),
                        "iteration had failing partitions"
                    );
                    (elapsed_ms, false)
                }
                Err(e) => {
                    if first_call {
                        if let Some(status) = unavailable(&e) {
                            warn!(status = status.label(), error = %e, "entry skipped");
                            return VariantResult::empty(variant, status);
                        }
                    }
                    warn!(iteration = i, error = %e, "iteration failed");
                    (0.0, false)
                }
            };
            first_call = false;
            if !ok {
                failed += 1;
            }
            samples.push(TimingSample {
                algorithm: callable.algorithm,
                variant,
                iteration: i as u32,
                elapsed_ms,
                ok,
            });

            if let Some(pause) = self.config.yield_between {
                if i + 1 < self.config.iterations {
                    thread::sleep(pause);
                }
            }
        }

        debug!(phase = %Phase::Aggregate);
        let times: Vec<f64> = samples.iter().map(|s| s.elapsed_ms).collect();
        let stat = TimingStat::from_samples(&times);
        let status = if failed == 0 {
            EntryStatus::Ok
        } else {
            EntryStatus::PartialFailure {
                failed_iterations: failed,
            }
        };

        debug!(phase = %Phase::Reported);
        info!(
            %callable,
            mean_ms = stat.mean_ms,
            status = status.label(),
            "entry finished"
        );
        VariantResult {
            variant,
            status,
            mean_ms: stat.mean_ms,
            stat,
            speedup: None,
            samples,
        }
    }

    /// Run every configured variant of one workload, baseline first.
    pub fn run_algorithm(&self, workload: &WorkloadSpec) -> ComparisonResult {
        let results = Variant::ALL
            .into_iter()
            .filter(|v| self.config.variants.contains(v))
            .map(|v| self.run_entry(workload, v))
            .collect();
        ComparisonResult::new(workload.algorithm(), workload.describe(), results)
    }

    /// Run every workload in order. Never aborts early.
    pub fn run_suite(&self, workloads: &[WorkloadSpec]) -> Vec<ComparisonResult> {
        info!(
            runtime = self.runtime.name(),
            workloads = workloads.len(),
            iterations = self.config.iterations,
            "running suite"
        );
        workloads
            .iter()
            .enumerate()
            .map(|(i, w)| {
                info!(
                    "[{}/{}] {} ({})",
                    i + 1,
                    workloads.len(),
                    w.algorithm(),
                    w.describe()
                );
                self.run_algorithm(w)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{MockConfig, MockRuntime, RuntimeState};
    use crate::core::{Algorithm, Viewport};

    fn small_mandelbrot() -> WorkloadSpec {
        WorkloadSpec::Mandelbrot {
            width: 8,
            height: 6,
            viewport: Viewport::default(),
            max_iter: 16,
        }
    }

    fn config(iterations: usize, warmup: usize) -> HarnessConfig {
        HarnessConfig {
            iterations,
            warmup,
            ..HarnessConfig::default()
        }
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let rt = MockRuntime::default_mock();
        assert!(Harness::new(&rt, config(0, 0)).is_err());
    }

    #[test]
    fn test_samples_in_iteration_order() {
        let rt = MockRuntime::default_mock();
        let harness = Harness::new(&rt, config(4, 2)).unwrap();
        let r = harness.run_entry(&small_mandelbrot(), Variant::CompiledSingle);
        assert_eq!(r.status, EntryStatus::Ok);
        let iterations: Vec<u32> = r.samples.iter().map(|s| s.iteration).collect();
        assert_eq!(iterations, vec![0, 1, 2, 3]);
        // Warm-up calls are made but not recorded.
        assert_eq!(rt.calls(), 6);
    }

    #[test]
    fn test_yield_pauses_between_timed_iterations_only() {
        let rt = MockRuntime::default_mock();
        let pause = Duration::from_millis(30);
        let harness = Harness::new(
            &rt,
            HarnessConfig {
                yield_between: Some(pause),
                ..config(3, 0)
            },
        )
        .unwrap();

        let started = Instant::now();
        let r = harness.run_entry(&small_mandelbrot(), Variant::CompiledSingle);
        assert!(started.elapsed() >= pause * 2);
        assert_eq!(r.samples.len(), 3);
        // The pause is not part of any sample.
        assert!(r.samples.iter().all(|s| s.elapsed_ms < 30.0), "{:?}", r.samples);

        // No pause after the last iteration.
        let long = Duration::from_secs(2);
        let single = Harness::new(
            &rt,
            HarnessConfig {
                yield_between: Some(long),
                ..config(1, 0)
            },
        )
        .unwrap();
        let started = Instant::now();
        single.run_entry(&small_mandelbrot(), Variant::CompiledSingle);
        assert!(started.elapsed() < long);
    }

    #[test]
    fn test_failed_iteration_is_zero_time_sample() {
        // Call 0 is the warm-up; call 2 is the second timed iteration.
        let rt = MockRuntime::new(
            MockConfig::new("mock")
                .fail_call(2)
                .with_delay(Duration::from_millis(2)),
        );
        let harness = Harness::new(&rt, config(3, 1)).unwrap();
        let r = harness.run_entry(&small_mandelbrot(), Variant::CompiledParallel);
        assert_eq!(r.status, EntryStatus::PartialFailure { failed_iterations: 1 });
        assert!(!r.samples[1].ok);
        assert_eq!(r.samples[1].elapsed_ms, 0.0);
        assert!(r.samples[0].ok && r.samples[0].elapsed_ms > 0.0);
        let expected = (r.samples[0].elapsed_ms + r.samples[2].elapsed_ms) / 3.0;
        assert!((r.mean_ms - expected).abs() < 1e-9);
    }

    #[test]
    fn test_partition_failures_keep_time_but_mark_sample() {
        let rt = MockRuntime::new(MockConfig::new("mock").with_partition_failures(1));
        let harness = Harness::new(&rt, config(2, 0)).unwrap();
        let r = harness.run_entry(&small_mandelbrot(), Variant::CompiledParallel);
        assert_eq!(r.status, EntryStatus::PartialFailure { failed_iterations: 2 });
        assert!(r.samples.iter().all(|s| !s.ok));
    }

    #[test]
    fn test_not_ready_runtime_yields_empty_entries() {
        let rt = MockRuntime::new(MockConfig::new("mock").with_state(RuntimeState::Uninitialized));
        let harness = Harness::new(&rt, config(2, 1)).unwrap();
        let cmp = harness.run_algorithm(&small_mandelbrot());
        assert_eq!(cmp.variants.len(), 3);

        let interp = cmp.variant(Variant::Interpreted).unwrap();
        assert_eq!(interp.status, EntryStatus::Ok);
        for v in [Variant::CompiledSingle, Variant::CompiledParallel] {
            let r = cmp.variant(v).unwrap();
            assert!(matches!(r.status, EntryStatus::NotReady { .. }));
            assert_eq!(r.mean_ms, 0.0);
            assert!(r.samples.is_empty());
            assert_eq!(r.speedup, None);
        }
        assert_eq!(rt.calls(), 0);
    }

    #[test]
    fn test_missing_variant_is_reported() {
        let missing = Callable::new(Algorithm::Mandelbrot, Variant::CompiledParallel);
        let rt = MockRuntime::new(MockConfig::new("mock").without_export(missing));
        let harness = Harness::new(&rt, config(1, 0)).unwrap();
        let cmp = harness.run_algorithm(&small_mandelbrot());
        let r = cmp.variant(Variant::CompiledParallel).unwrap();
        assert!(matches!(r.status, EntryStatus::Missing { .. }));
        assert_eq!(cmp.variant(Variant::CompiledSingle).unwrap().status, EntryStatus::Ok);
    }

    #[test]
    fn test_invalid_workload_does_not_abort_suite() {
        let rt = MockRuntime::default_mock();
        let harness = Harness::new(&rt, config(1, 0)).unwrap();
        let bad = WorkloadSpec::RayTrace {
            width: 0,
            height: 4,
            samples: 1,
        };
        let results = harness.run_suite(&[bad, small_mandelbrot()]);
        assert_eq!(results.len(), 2);
        assert!(
            results[0]
                .variants
                .iter()
                .all(|v| matches!(v.status, EntryStatus::InvalidWorkload { .. }))
        );
        assert!(results[1].variants.iter().all(|v| v.status.is_measured()));
    }

    #[test]
    fn test_variant_selection_keeps_baseline_order() {
        let rt = MockRuntime::default_mock();
        let harness = Harness::new(
            &rt,
            HarnessConfig {
                iterations: 1,
                warmup: 0,
                yield_between: None,
                variants: vec![Variant::CompiledParallel, Variant::Interpreted],
            },
        )
        .unwrap();
        let cmp = harness.run_algorithm(&small_mandelbrot());
        let order: Vec<Variant> = cmp.variants.iter().map(|v| v.variant).collect();
        assert_eq!(order, vec![Variant::Interpreted, Variant::CompiledParallel]);
    }

    #[test]
    fn test_run_config_reflects_settings() {
        let rt = MockRuntime::default_mock();
        let harness = Harness::new(
            &rt,
            HarnessConfig {
                iterations: 3,
                warmup: 2,
                yield_between: Some(Duration::from_millis(5)),
                variants: Variant::ALL.to_vec(),
            },
        )
        .unwrap();
        let cfg = harness.run_config();
        assert_eq!(cfg.measured_iterations, 3);
        assert_eq!(cfg.warmup_iterations, 2);
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.yield_ms, Some(5));
    }
}
