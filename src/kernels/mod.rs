//! Native algorithm kernels.
//!
//! Every kernel computes a contiguous range of workload units and writes into the
//! output slice that belongs to exactly that range. Kernels hold no state, so one
//! instance is shared by all workers of a pool.

pub mod hash;
pub mod mandelbrot;
pub mod matrix;
pub mod raytrace;

use std::ops::Range;

use crate::core::{Algorithm, WorkloadSpec};
use crate::{BenchError, BenchResult};

pub use hash::HashDiffusion;
pub use mandelbrot::Mandelbrot;
pub use matrix::MatrixMultiply;
pub use raytrace::RayTrace;

/// A pure computation over a range of workload units.
pub trait Kernel: Sync {
    /// Element type of the output buffer.
    type Elem: Copy + Default + Send + Sync;

    fn algorithm(&self) -> Algorithm;

    /// Compute `units` of `workload` into `out`.
    ///
    /// `out` holds `units.len() * workload.unit_stride()` elements and starts at
    /// the first element of `units.start`.
    fn run(
        &self,
        workload: &WorkloadSpec,
        units: Range<usize>,
        out: &mut [Self::Elem],
    ) -> BenchResult<()>;
}

fn mismatch(kernel: Algorithm, workload: &WorkloadSpec) -> BenchError {
    BenchError::InvalidWorkload(format!(
        "{kernel} kernel cannot run a {} workload",
        workload.algorithm()
    ))
}

fn check_slice(workload: &WorkloadSpec, units: &Range<usize>, len: usize) -> BenchResult<()> {
    let expected = units.len() * workload.unit_stride();
    if len != expected || units.end > workload.unit_count() {
        return Err(BenchError::Message(format!(
            "output slice of {len} elements does not match units {}..{} (expected {expected})",
            units.start, units.end
        )));
    }
    Ok(())
}
