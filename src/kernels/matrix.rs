//! Dense `n x n` matrix multiplication, one unit per output row.

use std::ops::Range;

use super::{Kernel, check_slice, mismatch};
use crate::BenchResult;
use crate::core::{Algorithm, WorkloadSpec};

#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixMultiply;

impl Kernel for MatrixMultiply {
    type Elem = f64;

    fn algorithm(&self) -> Algorithm {
        Algorithm::MatrixMultiply
    }

    fn run(&self, workload: &WorkloadSpec, units: Range<usize>, out: &mut [f64]) -> BenchResult<()> {
        let WorkloadSpec::MatrixMultiply { size, a, b } = workload else {
            return Err(mismatch(self.algorithm(), workload));
        };
        check_slice(workload, &units, out.len())?;
        multiply_rows(a, b, *size, units, out);
        Ok(())
    }
}

/// `out = A[rows] * B` using the `(i, k, j)` loop order so the innermost loop
/// walks both `B` and `C` sequentially.
pub fn multiply_rows(a: &[f64], b: &[f64], n: usize, rows: Range<usize>, out: &mut [f64]) {
    for (c_row, i) in out.chunks_exact_mut(n).zip(rows) {
        c_row.fill(0.0);
        let a_row = &a[i * n..(i + 1) * n];
        for (k, &aik) in a_row.iter().enumerate() {
            let b_row = &b[k * n..(k + 1) * n];
            for (c, &bkj) in c_row.iter_mut().zip(b_row) {
                *c += aik * bkj;
            }
        }
    }
}
