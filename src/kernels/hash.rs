//! Iterative hash diffusion.
//!
//! Iterations are grouped into blocks of [`HASH_BLOCK`]. Each block digests the
//! input independently from a block-specific start value, and the block digests
//! are folded into the seed in block order once every block is done. That fold
//! is the only order-dependent step, so any partitioning of blocks produces the
//! same 32-bit result.

use std::ops::Range;

use super::{Kernel, check_slice, mismatch};
use crate::BenchResult;
use crate::core::{Algorithm, WorkloadSpec};

pub const HASH_SEED: u32 = 5381;
pub const HASH_BLOCK: usize = 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct HashDiffusion;

impl Kernel for HashDiffusion {
    type Elem = u32;

    fn algorithm(&self) -> Algorithm {
        Algorithm::HashDiffusion
    }

    fn run(&self, workload: &WorkloadSpec, units: Range<usize>, out: &mut [u32]) -> BenchResult<()> {
        let WorkloadSpec::HashDiffusion { data, iterations } = workload else {
            return Err(mismatch(self.algorithm(), workload));
        };
        check_slice(workload, &units, out.len())?;
        for (digest, block) in out.iter_mut().zip(units) {
            *digest = block_digest(data, block, *iterations);
        }
        Ok(())
    }
}

/// One diffusion step: multiply by 33, mix in `b`, rotate left by 5.
#[inline]
pub fn mix(h: u32, b: u32) -> u32 {
    (h.wrapping_mul(33) ^ b).rotate_left(5)
}

pub fn block_digest(data: &[u8], block: usize, iterations: u32) -> u32 {
    let start = block * HASH_BLOCK;
    let end = (start + HASH_BLOCK).min(iterations as usize);
    let mut h = HASH_SEED ^ block as u32;
    for _ in start..end {
        for &byte in data {
            h = mix(h, u32::from(byte));
        }
    }
    h
}

/// Fold block digests into the seed, in block order.
pub fn fold_digests(digests: &[u32]) -> u32 {
    digests.iter().fold(HASH_SEED, |h, d| mix(h, *d))
}

/// Whole-workload hash on the calling thread.
pub fn diffuse(data: &[u8], iterations: u32) -> u32 {
    let blocks = (iterations as usize).div_ceil(HASH_BLOCK);
    let digests: Vec<u32> = (0..blocks)
        .map(|block| block_digest(data, block, iterations))
        .collect();
    fold_digests(&digests)
}
