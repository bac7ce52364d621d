//! Worker-pool executor.
//!
//! One scoped thread per partition, each owning the disjoint slice of the output
//! buffer that belongs to its unit range. The end of the thread scope is the join
//! barrier: the caller never sees the buffer before every worker has finished or
//! failed. The buffer itself is never locked.

use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::partition::{Partition, partition};
use crate::core::WorkloadSpec;
use crate::kernels::Kernel;
use crate::{BenchError, BenchResult};

/// A partition whose kernel returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionFailure {
    pub partition: Partition,
    pub reason: String,
}

impl From<PartitionFailure> for BenchError {
    fn from(f: PartitionFailure) -> Self {
        BenchError::PartitionFailure {
            partition: f.partition.index,
            reason: f.reason,
        }
    }
}

/// Merged output of one kernel invocation.
#[derive(Debug, Clone)]
pub struct Execution<T> {
    pub output: Vec<T>,
    /// Failed partitions; their slices of `output` hold `T::default()`.
    pub failures: Vec<PartitionFailure>,
}

impl<T> Execution<T> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fixed-size pool, dispatched per invocation.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: NonZeroUsize,
}

impl WorkerPool {
    pub fn new(workers: NonZeroUsize) -> Self {
        WorkerPool { workers }
    }

    pub fn with_workers(workers: usize) -> BenchResult<Self> {
        NonZeroUsize::new(workers)
            .map(Self::new)
            .ok_or_else(|| BenchError::InvalidWorkload("worker count must be positive".into()))
    }

    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    /// Run `kernel` over `workload` on up to `workers` threads.
    pub fn execute<K: Kernel>(
        &self,
        workload: &WorkloadSpec,
        kernel: &K,
    ) -> BenchResult<Execution<K::Elem>> {
        workload.validate()?;
        let mut output = vec![K::Elem::default(); workload.output_len()];
        let units = workload.unit_count();
        if units == 0 {
            return Ok(Execution {
                output,
                failures: Vec::new(),
            });
        }

        let stride = workload.unit_stride();
        let parts = partition(units, self.workers())?;
        debug!(
            algorithm = %kernel.algorithm(),
            units,
            partitions = parts.len(),
            "dispatching partitions"
        );

        let outcomes: Vec<Result<(), String>> = thread::scope(|s| {
            let mut rest: &mut [K::Elem] = &mut output;
            let mut handles = Vec::with_capacity(parts.len());
            for part in &parts {
                let (slice, tail) = std::mem::take(&mut rest).split_at_mut(part.len() * stride);
                rest = tail;
                handles.push(s.spawn(move || kernel.run(workload, part.units(), slice)));
            }
            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(result) => result.map_err(|e| e.to_string()),
                    Err(payload) => Err(panic_message(payload)),
                })
                .collect()
        });

        let failures = settle(&mut output, &parts, outcomes, stride);
        Ok(Execution { output, failures })
    }

    /// Degenerate case: one partition over the whole workload on the calling thread.
    pub fn execute_single<K: Kernel>(
        workload: &WorkloadSpec,
        kernel: &K,
    ) -> BenchResult<Execution<K::Elem>> {
        workload.validate()?;
        let mut output = vec![K::Elem::default(); workload.output_len()];
        let units = workload.unit_count();
        if units == 0 {
            return Ok(Execution {
                output,
                failures: Vec::new(),
            });
        }

        let whole = Partition {
            index: 0,
            start: 0,
            end: units,
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            kernel.run(workload, whole.units(), &mut output)
        }));
        let outcome = match outcome {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(payload) => Err(panic_message(payload)),
        };

        let failures = settle(&mut output, &[whole], vec![outcome], workload.unit_stride());
        Ok(Execution { output, failures })
    }
}

/// Reset the slices of failed partitions and collect their failures.
fn settle<T: Copy + Default>(
    output: &mut [T],
    parts: &[Partition],
    outcomes: Vec<Result<(), String>>,
    stride: usize,
) -> Vec<PartitionFailure> {
    let mut failures = Vec::new();
    for (part, outcome) in parts.iter().zip(outcomes) {
        if let Err(reason) = outcome {
            warn!(partition = part.index, start = part.start, end = part.end, %reason, "partition failed");
            output[part.scale(stride)].fill(T::default());
            failures.push(PartitionFailure {
                partition: *part,
                reason,
            });
        }
    }
    failures
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("worker panicked: {s}")
    } else {
        "worker panicked".to_string()
    }
}
