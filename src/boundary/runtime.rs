//! Compiled runtime: lifecycle, function table and the trait callers depend on.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::callable::Callable;
use super::payload::Output;
use crate::core::{Algorithm, Variant, WorkloadSpec};
use crate::engine::{Execution, PartitionFailure, WorkerPool};
use crate::kernels::hash::fold_digests;
use crate::kernels::{HashDiffusion, Kernel, Mandelbrot, MatrixMultiply, RayTrace};
use crate::{BenchError, BenchResult};

/// Lifecycle phase of a runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RuntimeState {
    Uninitialized,
    Initializing,
    Ready,
    Failed { reason: String },
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeState::Uninitialized => f.write_str("uninitialized"),
            RuntimeState::Initializing => f.write_str("initializing"),
            RuntimeState::Ready => f.write_str("ready"),
            RuntimeState::Failed { reason } => write!(f, "failed ({reason})"),
        }
    }
}

/// Output of one compiled call, with any partitions that failed along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub output: Output,
    pub failures: Vec<PartitionFailure>,
}

impl Invocation {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn the first partition failure into an error.
    pub fn into_result(self) -> BenchResult<Output> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.into()),
            None => Ok(self.output),
        }
    }
}

/// A runtime serving compiled callables.
pub trait Runtime: Send + Sync {
    fn name(&self) -> &str;

    fn state(&self) -> RuntimeState;

    /// Worker count used by parallel callables.
    fn workers(&self) -> usize;

    fn has_export(&self, callable: Callable) -> bool;

    /// Run an exported callable. Callers check `state()` and `has_export()` first.
    fn invoke(&self, callable: Callable, workload: &WorkloadSpec) -> BenchResult<Invocation>;
}

/// Native kernels the function table can export.
trait Export: Kernel + Default {
    fn wrap(output: Vec<Self::Elem>) -> Output;
}

impl Export for MatrixMultiply {
    fn wrap(output: Vec<f64>) -> Output {
        Output::F64(output)
    }
}

impl Export for Mandelbrot {
    fn wrap(output: Vec<u32>) -> Output {
        Output::U32(output)
    }
}

impl Export for HashDiffusion {
    fn wrap(digests: Vec<u32>) -> Output {
        Output::Hash(fold_digests(&digests))
    }
}

impl Export for RayTrace {
    fn wrap(output: Vec<f64>) -> Output {
        Output::F64(output)
    }
}

type Entry = fn(&WorkerPool, &WorkloadSpec) -> BenchResult<Invocation>;

fn invocation<K: Export>(exec: Execution<K::Elem>) -> Invocation {
    Invocation {
        output: K::wrap(exec.output),
        failures: exec.failures,
    }
}

fn single<K: Export>(_pool: &WorkerPool, workload: &WorkloadSpec) -> BenchResult<Invocation> {
    Ok(invocation::<K>(WorkerPool::execute_single(workload, &K::default())?))
}

fn parallel<K: Export>(pool: &WorkerPool, workload: &WorkloadSpec) -> BenchResult<Invocation> {
    Ok(invocation::<K>(pool.execute(workload, &K::default())?))
}

fn entry(callable: Callable) -> Option<Entry> {
    let entry: Entry = match (callable.algorithm, callable.variant) {
        (_, Variant::Interpreted) => return None,
        (Algorithm::MatrixMultiply, Variant::CompiledSingle) => single::<MatrixMultiply>,
        (Algorithm::MatrixMultiply, Variant::CompiledParallel) => parallel::<MatrixMultiply>,
        (Algorithm::Mandelbrot, Variant::CompiledSingle) => single::<Mandelbrot>,
        (Algorithm::Mandelbrot, Variant::CompiledParallel) => parallel::<Mandelbrot>,
        (Algorithm::HashDiffusion, Variant::CompiledSingle) => single::<HashDiffusion>,
        (Algorithm::HashDiffusion, Variant::CompiledParallel) => parallel::<HashDiffusion>,
        (Algorithm::RayTrace, Variant::CompiledSingle) => single::<RayTrace>,
        (Algorithm::RayTrace, Variant::CompiledParallel) => parallel::<RayTrace>,
    };
    Some(entry)
}

/// Options for [`RuntimeHandle::initialize`].
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub name: String,
    pub workers: usize,
    /// Callables to export; `None` exports every compiled callable.
    pub exports: Option<Vec<Callable>>,
}

impl RuntimeOptions {
    pub fn new(workers: usize) -> Self {
        RuntimeOptions {
            name: "native".to_string(),
            workers,
            exports: None,
        }
    }

    pub fn with_exports(mut self, exports: Vec<Callable>) -> Self {
        self.exports = Some(exports);
        self
    }
}

/// The native runtime, created uninitialized and injected into callers once ready.
#[derive(Debug)]
pub struct RuntimeHandle {
    options: RuntimeOptions,
    state: RuntimeState,
    pool: Option<WorkerPool>,
    table: BTreeMap<Callable, Entry>,
}

impl RuntimeHandle {
    pub fn new(options: RuntimeOptions) -> Self {
        RuntimeHandle {
            options,
            state: RuntimeState::Uninitialized,
            pool: None,
            table: BTreeMap::new(),
        }
    }

    /// Create and initialize a runtime exporting every compiled callable.
    pub fn native(workers: usize) -> BenchResult<Self> {
        let mut handle = Self::new(RuntimeOptions::new(workers));
        handle.initialize()?;
        Ok(handle)
    }

    /// Build the worker pool and function table. Idempotent once ready; a failed
    /// runtime stays failed.
    pub fn initialize(&mut self) -> BenchResult<()> {
        match &self.state {
            RuntimeState::Ready => return Ok(()),
            RuntimeState::Failed { reason } => {
                return Err(BenchError::NotReady(format!(
                    "{} failed to initialize: {reason}",
                    self.options.name
                )));
            }
            RuntimeState::Uninitialized | RuntimeState::Initializing => {}
        }

        self.state = RuntimeState::Initializing;
        debug!(runtime = %self.options.name, "initializing runtime");
        match self.load() {
            Ok((pool, table)) => {
                info!(
                    runtime = %self.options.name,
                    workers = pool.workers(),
                    exports = table.len(),
                    "runtime ready"
                );
                self.pool = Some(pool);
                self.table = table;
                self.state = RuntimeState::Ready;
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(runtime = %self.options.name, %reason, "runtime failed to initialize");
                self.state = RuntimeState::Failed {
                    reason: reason.clone(),
                };
                Err(BenchError::NotReady(reason))
            }
        }
    }

    fn load(&self) -> BenchResult<(WorkerPool, BTreeMap<Callable, Entry>)> {
        let pool = WorkerPool::with_workers(self.options.workers)?;
        let exports = self.options.exports.clone().unwrap_or_else(Callable::compiled);
        let mut table = BTreeMap::new();
        for callable in exports {
            let e = entry(callable).ok_or_else(|| {
                BenchError::Message(format!("{callable} cannot be exported by a compiled runtime"))
            })?;
            table.insert(callable, e);
        }
        Ok((pool, table))
    }

    pub fn exports(&self) -> impl Iterator<Item = Callable> + '_ {
        self.table.keys().copied()
    }
}

impl Runtime for RuntimeHandle {
    fn name(&self) -> &str {
        &self.options.name
    }

    fn state(&self) -> RuntimeState {
        self.state.clone()
    }

    fn workers(&self) -> usize {
        self.pool.map_or(self.options.workers, |p| p.workers())
    }

    fn has_export(&self, callable: Callable) -> bool {
        self.table.contains_key(&callable)
    }

    fn invoke(&self, callable: Callable, workload: &WorkloadSpec) -> BenchResult<Invocation> {
        let (RuntimeState::Ready, Some(pool)) = (&self.state, self.pool.as_ref()) else {
            return Err(BenchError::NotReady(format!(
                "{} is {}",
                self.options.name, self.state
            )));
        };
        let entry = self
            .table
            .get(&callable)
            .ok_or_else(|| BenchError::MissingVariant(callable.name()))?;
        debug!(%callable, workers = pool.workers(), "invoking export");
        entry(pool, workload)
    }
}
