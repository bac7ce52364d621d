//! Engine module: partitioning, parallel execution and the benchmark harness.
//!
//! # Architecture
//!
//! - **Partitioner** (`partition`): splits a workload's units into balanced,
//!   contiguous ranges, one per worker.
//! - **Worker pool** (`pool`): runs a kernel over those ranges on scoped threads,
//!   each writing its own disjoint slice of the output buffer.
//! - **Harness** (`harness`): drives every variant of every workload through the
//!   runtime boundary and aggregates timings into comparison results.
//!
//! The harness never talks to the pool directly; parallel execution is reached
//! only through a runtime's exported callables.

pub mod harness;
pub mod partition;
pub mod pool;

pub use harness::{Harness, HarnessConfig};
pub use partition::{Partition, partition};
pub use pool::{Execution, PartitionFailure, WorkerPool};
