//! Mock runtime for testing.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::callable::Callable;
use super::payload::Output;
use super::runtime::{Invocation, Runtime, RuntimeState};
use crate::core::{Algorithm, WorkloadSpec};
use crate::engine::{Partition, PartitionFailure};
use crate::kernels::hash::HASH_SEED;
use crate::{BenchError, BenchResult};

/// Configuration for mock runtime responses.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Name to report
    pub name: String,
    /// Lifecycle state to report
    pub state: RuntimeState,
    /// Worker count to report
    pub workers: usize,
    /// Exported callables
    pub exports: BTreeSet<Callable>,
    /// Output to return; a zeroed buffer of the right shape when unset
    pub output: Option<Output>,
    /// Zero-based call numbers that return an error
    pub failing_calls: BTreeSet<usize>,
    /// Partition failures attached to every successful call
    pub partition_failures: usize,
    /// Simulated work per call
    pub delay: Option<Duration>,
}

impl MockConfig {
    /// Create a ready mock config exporting every compiled callable.
    pub fn new(name: impl Into<String>) -> Self {
        MockConfig {
            name: name.into(),
            state: RuntimeState::Ready,
            workers: 4,
            exports: Callable::compiled().into_iter().collect(),
            output: None,
            failing_calls: BTreeSet::new(),
            partition_failures: 0,
            delay: None,
        }
    }

    /// Set the reported state.
    pub fn with_state(mut self, state: RuntimeState) -> Self {
        self.state = state;
        self
    }

    /// Export only the given callables.
    pub fn with_exports(mut self, exports: impl IntoIterator<Item = Callable>) -> Self {
        self.exports = exports.into_iter().collect();
        self
    }

    /// Remove one export.
    pub fn without_export(mut self, callable: Callable) -> Self {
        self.exports.remove(&callable);
        self
    }

    /// Set the output.
    pub fn with_output(mut self, output: Output) -> Self {
        self.output = Some(output);
        self
    }

    /// Make the given call (zero-based, warm-up calls included) fail.
    pub fn fail_call(mut self, call: usize) -> Self {
        self.failing_calls.insert(call);
        self
    }

    /// Report `count` failed partitions on every call.
    pub fn with_partition_failures(mut self, count: usize) -> Self {
        self.partition_failures = count;
        self
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Mock runtime for unit testing.
///
/// Returns configurable fake results without running any kernel.
#[derive(Debug)]
pub struct MockRuntime {
    config: MockConfig,
    calls: AtomicUsize,
}

impl MockRuntime {
    /// Create a new mock runtime with the given configuration.
    pub fn new(config: MockConfig) -> Self {
        MockRuntime {
            config,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a ready mock runtime with default configuration.
    pub fn default_mock() -> Self {
        Self::new(MockConfig::new("mock"))
    }

    /// Number of `invoke` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn zeroed(workload: &WorkloadSpec) -> Output {
        match workload.algorithm() {
            Algorithm::MatrixMultiply | Algorithm::RayTrace => {
                Output::F64(vec![0.0; workload.output_len()])
            }
            Algorithm::Mandelbrot => Output::U32(vec![0; workload.output_len()]),
            Algorithm::HashDiffusion => Output::Hash(HASH_SEED),
        }
    }
}

impl Runtime for MockRuntime {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn state(&self) -> RuntimeState {
        self.config.state.clone()
    }

    fn workers(&self) -> usize {
        self.config.workers
    }

    fn has_export(&self, callable: Callable) -> bool {
        self.config.exports.contains(&callable)
    }

    fn invoke(&self, callable: Callable, workload: &WorkloadSpec) -> BenchResult<Invocation> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.config.state != RuntimeState::Ready {
            return Err(BenchError::NotReady(format!(
                "{} is {}",
                self.config.name, self.config.state
            )));
        }
        if !self.has_export(callable) {
            return Err(BenchError::MissingVariant(callable.name()));
        }
        if let Some(delay) = self.config.delay {
            std::thread::sleep(delay);
        }
        if self.config.failing_calls.contains(&call) {
            return Err(BenchError::Message(format!("mock call {call} failed")));
        }
        let failures = (0..self.config.partition_failures)
            .map(|index| PartitionFailure {
                partition: Partition {
                    index,
                    start: index,
                    end: index + 1,
                },
                reason: "mock partition failure".to_string(),
            })
            .collect();
        Ok(Invocation {
            output: self
                .config
                .output
                .clone()
                .unwrap_or_else(|| Self::zeroed(workload)),
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Variant;

    fn workload() -> WorkloadSpec {
        WorkloadSpec::RayTrace {
            width: 2,
            height: 2,
            samples: 1,
        }
    }

    #[test]
    fn test_mock_runtime_default() {
        let rt = MockRuntime::default_mock();
        assert_eq!(rt.name(), "mock");
        assert_eq!(rt.state(), RuntimeState::Ready);
        let c = Callable::new(Algorithm::RayTrace, Variant::CompiledSingle);
        let inv = rt.invoke(c, &workload()).unwrap();
        assert_eq!(inv.output, Output::F64(vec![0.0; 12]));
        assert_eq!(rt.calls(), 1);
    }

    #[test]
    fn test_mock_runtime_failing_call() {
        let rt = MockRuntime::new(MockConfig::new("mock").fail_call(1));
        let c = Callable::new(Algorithm::RayTrace, Variant::CompiledParallel);
        assert!(rt.invoke(c, &workload()).is_ok());
        assert!(rt.invoke(c, &workload()).is_err());
        assert!(rt.invoke(c, &workload()).is_ok());
    }

    #[test]
    fn test_mock_runtime_partition_failures() {
        let rt = MockRuntime::new(
            MockConfig::new("mock")
                .with_partition_failures(2)
                .with_output(Output::Hash(7)),
        );
        let c = Callable::new(Algorithm::HashDiffusion, Variant::CompiledParallel);
        let inv = rt.invoke(c, &workload()).unwrap();
        assert_eq!(inv.failures.len(), 2);
        assert_eq!(inv.output, Output::Hash(7));
        assert!(matches!(
            inv.into_result(),
            Err(BenchError::PartitionFailure { partition: 0, .. })
        ));
    }

    #[test]
    fn test_mock_runtime_not_ready() {
        let rt = MockRuntime::new(MockConfig::new("mock").with_state(RuntimeState::Initializing));
        let c = Callable::new(Algorithm::Mandelbrot, Variant::CompiledSingle);
        assert!(matches!(
            rt.invoke(c, &workload()),
            Err(BenchError::NotReady(_))
        ));
    }
}
