//! Mandelbrot escape-time raster, one unit per pixel row.

use std::ops::Range;

use super::{Kernel, check_slice, mismatch};
use crate::BenchResult;
use crate::core::{Algorithm, Viewport, WorkloadSpec};

#[derive(Debug, Clone, Copy, Default)]
pub struct Mandelbrot;

impl Kernel for Mandelbrot {
    type Elem = u32;

    fn algorithm(&self) -> Algorithm {
        Algorithm::Mandelbrot
    }

    fn run(&self, workload: &WorkloadSpec, units: Range<usize>, out: &mut [u32]) -> BenchResult<()> {
        let WorkloadSpec::Mandelbrot {
            width,
            height,
            viewport,
            max_iter,
        } = workload
        else {
            return Err(mismatch(self.algorithm(), workload));
        };
        check_slice(workload, &units, out.len())?;
        render_rows(*width, *height, viewport, *max_iter, units, out);
        Ok(())
    }
}

pub fn render_rows(
    width: usize,
    height: usize,
    viewport: &Viewport,
    max_iter: u32,
    rows: Range<usize>,
    out: &mut [u32],
) {
    for (row, py) in out.chunks_exact_mut(width).zip(rows) {
        let cy = lerp(viewport.ymin, viewport.ymax, py, height);
        for (px, pixel) in row.iter_mut().enumerate() {
            let cx = lerp(viewport.xmin, viewport.xmax, px, width);
            *pixel = escape_time(cx, cy, max_iter);
        }
    }
}

/// Map pixel `p` of `extent` onto `[min, max]`.
pub fn lerp(min: f64, max: f64, p: usize, extent: usize) -> f64 {
    min + (max - min) * p as f64 / extent as f64
}

/// Iterations of `z <- z^2 + c` before `|z|^2 > 4`, capped at `max_iter`.
pub fn escape_time(cx: f64, cy: f64, max_iter: u32) -> u32 {
    let (mut zr, mut zi) = (0.0_f64, 0.0_f64);
    let mut n = 0;
    while n < max_iter {
        let zr2 = zr * zr;
        let zi2 = zi * zi;
        if zr2 + zi2 > 4.0 {
            break;
        }
        zi = 2.0 * zr * zi + cy;
        zr = zr2 - zi2 + cx;
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_reaches_max_iter() {
        let w = WorkloadSpec::Mandelbrot {
            width: 1,
            height: 1,
            viewport: Viewport {
                xmin: 0.0,
                xmax: 0.0,
                ymin: 0.0,
                ymax: 0.0,
            },
            max_iter: 10,
        };
        let mut out = [0u32];
        Mandelbrot.run(&w, 0..1, &mut out).unwrap();
        assert_eq!(out, [10]);
    }

    #[test]
    fn test_far_point_escapes_immediately() {
        assert_eq!(escape_time(3.0, 3.0, 50), 1);
        assert_eq!(escape_time(-1.0, 0.0, 50), 50);
    }

    #[test]
    fn test_counts_stay_in_range() {
        let max_iter = 32;
        let w = WorkloadSpec::Mandelbrot {
            width: 40,
            height: 30,
            viewport: Viewport::default(),
            max_iter,
        };
        let mut out = vec![0u32; w.output_len()];
        Mandelbrot.run(&w, 0..30, &mut out).unwrap();
        assert!(out.iter().all(|n| *n <= max_iter));
        assert!(out.contains(&max_iter));
        assert!(out.iter().any(|n| *n < max_iter));
    }
}
