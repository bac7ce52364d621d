//! Monte-Carlo ray tracing of a single Lambertian sphere, one unit per image row.
//!
//! Sample jitter comes from a stateless hash of the pixel and sample index, so a
//! pixel's colour does not depend on which worker renders it.

use std::ops::Range;

use super::{Kernel, check_slice, mismatch};
use crate::BenchResult;
use crate::core::{Algorithm, WorkloadSpec};

pub const BACKGROUND: [f64; 3] = [0.2, 0.2, 0.8];
pub const SPHERE_CENTER: [f64; 3] = [0.0, 0.0, -3.0];
pub const SPHERE_RADIUS: f64 = 1.0;
pub const ALBEDO: [f64; 3] = [1.0, 0.3, 0.3];
/// `normalize(1, 1, 1)`
pub const LIGHT_DIR: [f64; 3] = [
    0.577_350_269_189_625_8,
    0.577_350_269_189_625_8,
    0.577_350_269_189_625_8,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct RayTrace;

impl Kernel for RayTrace {
    type Elem = f64;

    fn algorithm(&self) -> Algorithm {
        Algorithm::RayTrace
    }

    fn run(&self, workload: &WorkloadSpec, units: Range<usize>, out: &mut [f64]) -> BenchResult<()> {
        let WorkloadSpec::RayTrace {
            width,
            height,
            samples,
        } = workload
        else {
            return Err(mismatch(self.algorithm(), workload));
        };
        check_slice(workload, &units, out.len())?;
        for (row, py) in out.chunks_exact_mut(width * 3).zip(units) {
            for (px, rgb) in row.chunks_exact_mut(3).enumerate() {
                rgb.copy_from_slice(&shade_pixel(px, py, *width, *height, *samples));
            }
        }
        Ok(())
    }
}

/// Integer avalanche hash (lowbias32).
#[inline]
pub fn scramble(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

/// Sub-pixel offsets in `[0, 1)` for one sample of one pixel.
pub fn jitter(pixel: u32, samples: u32, sample: u32) -> (f64, f64) {
    let key = pixel.wrapping_mul(samples).wrapping_add(sample).wrapping_mul(2);
    let jx = f64::from(scramble(key) >> 8) / 16_777_216.0;
    let jy = f64::from(scramble(key.wrapping_add(1)) >> 8) / 16_777_216.0;
    (jx, jy)
}

/// Normalized primary ray direction through a (jittered) pixel position.
pub fn primary_ray(x: f64, y: f64, width: usize, height: usize) -> [f64; 3] {
    let w = width as f64;
    let h = height as f64;
    let u = (2.0 * x / w - 1.0) * (w / h);
    let v = 1.0 - 2.0 * y / h;
    let len = (u * u + v * v + 1.0).sqrt();
    [u / len, v / len, -1.0 / len]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Colour seen along `dir` from the camera at the origin.
pub fn trace(dir: [f64; 3]) -> [f64; 3] {
    let oc = [
        0.0 - SPHERE_CENTER[0],
        0.0 - SPHERE_CENTER[1],
        0.0 - SPHERE_CENTER[2],
    ];
    let b = dot(oc, dir);
    let c = dot(oc, oc) - SPHERE_RADIUS * SPHERE_RADIUS;
    let disc = b * b - c;
    if disc < 0.0 {
        return BACKGROUND;
    }
    let sq = disc.sqrt();
    let mut t = -b - sq;
    if t < 0.0 {
        t = -b + sq;
    }
    if t < 0.0 {
        return BACKGROUND;
    }
    let normal = [
        (dir[0] * t - SPHERE_CENTER[0]) / SPHERE_RADIUS,
        (dir[1] * t - SPHERE_CENTER[1]) / SPHERE_RADIUS,
        (dir[2] * t - SPHERE_CENTER[2]) / SPHERE_RADIUS,
    ];
    let diffuse = f64::max(0.0, dot(normal, LIGHT_DIR));
    [ALBEDO[0] * diffuse, ALBEDO[1] * diffuse, ALBEDO[2] * diffuse]
}

/// Average colour of `samples` jittered rays through pixel `(px, py)`.
pub fn shade_pixel(px: usize, py: usize, width: usize, height: usize, samples: u32) -> [f64; 3] {
    let pixel = (py * width + px) as u32;
    let mut sum = [0.0; 3];
    for s in 0..samples {
        let (jx, jy) = jitter(pixel, samples, s);
        let color = trace(primary_ray(px as f64 + jx, py as f64 + jy, width, height));
        sum[0] += color[0];
        sum[1] += color[1];
        sum[2] += color[2];
    }
    let n = f64::from(samples);
    [sum[0] / n, sum[1] / n, sum[2] / n]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f64; 3], b: [f64; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_corner_ray_misses_sphere() {
        let color = shade_pixel(0, 0, 64, 64, 4);
        assert!(close(color, BACKGROUND), "got {color:?}");
    }

    #[test]
    fn test_center_ray_hits_lit_sphere() {
        let color = trace([0.0, 0.0, -1.0]);
        // Normal at the front of the sphere points at the camera: (0, 0, 1).
        let expected = ALBEDO.map(|c| c * LIGHT_DIR[2]);
        assert!(close(color, expected), "got {color:?}");
    }

    #[test]
    fn test_jitter_in_unit_square() {
        for s in 0..16 {
            let (jx, jy) = jitter(1234, 16, s);
            assert!((0.0..1.0).contains(&jx));
            assert!((0.0..1.0).contains(&jy));
        }
    }

    #[test]
    fn test_kernel_fills_rgb_triplets() {
        let w = WorkloadSpec::RayTrace {
            width: 16,
            height: 12,
            samples: 2,
        };
        let mut out = vec![-1.0; w.output_len()];
        RayTrace.run(&w, 0..12, &mut out).unwrap();
        assert!(out.iter().all(|c| (0.0..=1.0).contains(c)));
        // Centre pixel looks at the sphere.
        let idx = (6 * 16 + 8) * 3;
        assert!(!close([out[idx], out[idx + 1], out[idx + 2]], BACKGROUND));
    }
}
