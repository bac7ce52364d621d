//! Splitting workload units into balanced, disjoint, contiguous ranges.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{BenchError, BenchResult};

/// A contiguous range `[start, end)` of workload units assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn units(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Element range of this partition in a buffer holding `stride` elements per unit.
    pub fn scale(&self, stride: usize) -> Range<usize> {
        self.start * stride..self.end * stride
    }
}

/// Split `units` into at most `workers` partitions.
///
/// The first `units % workers` partitions get one extra unit, so sizes differ by
/// at most one. With fewer units than workers every partition holds exactly one
/// unit and the remaining workers stay idle.
pub fn partition(units: usize, workers: usize) -> BenchResult<Vec<Partition>> {
    if units == 0 {
        return Err(BenchError::InvalidWorkload(
            "cannot partition an empty workload".into(),
        ));
    }
    if workers == 0 {
        return Err(BenchError::InvalidWorkload(
            "worker count must be positive".into(),
        ));
    }

    let count = workers.min(units);
    let base = units / count;
    let extra = units % count;

    let mut parts = Vec::with_capacity(count);
    let mut start = 0;
    for index in 0..count {
        let len = base + usize::from(index < extra);
        parts.push(Partition {
            index,
            start,
            end: start + len,
        });
        start += len;
    }
    debug_assert_eq!(start, units);
    Ok(parts)
}
