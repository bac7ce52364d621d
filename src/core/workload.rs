//! Workload definitions: what a benchmark entry computes and how big it is.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::schema::Algorithm;
use crate::kernels::hash::HASH_BLOCK;
use crate::{BenchError, BenchResult};

/// Complex-plane window mapped onto a Mandelbrot raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            xmin: -2.0,
            xmax: 1.0,
            ymin: -1.5,
            ymax: 1.5,
        }
    }
}

impl Viewport {
    fn validate(&self) -> BenchResult<()> {
        let bounds = [self.xmin, self.xmax, self.ymin, self.ymax];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(BenchError::InvalidWorkload(
                "viewport bounds must be finite".into(),
            ));
        }
        if self.xmin > self.xmax || self.ymin > self.ymax {
            return Err(BenchError::InvalidWorkload(format!(
                "malformed viewport [{}, {}] x [{}, {}]",
                self.xmin, self.xmax, self.ymin, self.ymax
            )));
        }
        Ok(())
    }
}

/// One benchmark workload with its parameters and generated inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkloadSpec {
    MatrixMultiply {
        size: usize,
        a: Vec<f64>,
        b: Vec<f64>,
    },
    Mandelbrot {
        width: usize,
        height: usize,
        viewport: Viewport,
        max_iter: u32,
    },
    HashDiffusion {
        data: Vec<u8>,
        iterations: u32,
    },
    RayTrace {
        width: usize,
        height: usize,
        samples: u32,
    },
}

impl WorkloadSpec {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            WorkloadSpec::MatrixMultiply { .. } => Algorithm::MatrixMultiply,
            WorkloadSpec::Mandelbrot { .. } => Algorithm::Mandelbrot,
            WorkloadSpec::HashDiffusion { .. } => Algorithm::HashDiffusion,
            WorkloadSpec::RayTrace { .. } => Algorithm::RayTrace,
        }
    }

    /// Reject workloads that cannot be run.
    ///
    /// A hash workload with zero iterations is accepted: it is the identity case
    /// and yields the seed.
    pub fn validate(&self) -> BenchResult<()> {
        match self {
            WorkloadSpec::MatrixMultiply { size, a, b } => {
                if *size == 0 {
                    return Err(BenchError::InvalidWorkload(
                        "matrix size must be positive".into(),
                    ));
                }
                let expected = size
                    .checked_mul(*size)
                    .ok_or_else(|| BenchError::InvalidWorkload("matrix size overflows".into()))?;
                if a.len() != expected || b.len() != expected {
                    return Err(BenchError::InvalidWorkload(format!(
                        "matrices must hold {expected} elements (got {} and {})",
                        a.len(),
                        b.len()
                    )));
                }
            }
            WorkloadSpec::Mandelbrot {
                width,
                height,
                viewport,
                max_iter,
            } => {
                check_raster(*width, *height, 1)?;
                viewport.validate()?;
                if *max_iter == 0 {
                    return Err(BenchError::InvalidWorkload(
                        "max_iter must be positive".into(),
                    ));
                }
            }
            WorkloadSpec::HashDiffusion { .. } => {}
            WorkloadSpec::RayTrace {
                width,
                height,
                samples,
            } => {
                check_raster(*width, *height, 3)?;
                if *samples == 0 {
                    return Err(BenchError::InvalidWorkload(
                        "samples must be positive".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Number of independently computable units.
    pub fn unit_count(&self) -> usize {
        match self {
            WorkloadSpec::MatrixMultiply { size, .. } => *size,
            WorkloadSpec::Mandelbrot { height, .. } => *height,
            WorkloadSpec::HashDiffusion { iterations, .. } => {
                (*iterations as usize).div_ceil(HASH_BLOCK)
            }
            WorkloadSpec::RayTrace { height, .. } => *height,
        }
    }

    /// Output elements written per unit.
    pub fn unit_stride(&self) -> usize {
        match self {
            WorkloadSpec::MatrixMultiply { size, .. } => *size,
            WorkloadSpec::Mandelbrot { width, .. } => *width,
            WorkloadSpec::HashDiffusion { .. } => 1,
            WorkloadSpec::RayTrace { width, .. } => width * 3,
        }
    }

    /// Length of the output buffer.
    pub fn output_len(&self) -> usize {
        self.unit_count() * self.unit_stride()
    }

    /// Short description used in reports.
    pub fn describe(&self) -> String {
        match self {
            WorkloadSpec::MatrixMultiply { size, .. } => format!("{size}x{size}"),
            WorkloadSpec::Mandelbrot {
                width,
                height,
                max_iter,
                ..
            } => format!("{width}x{height} max_iter={max_iter}"),
            WorkloadSpec::HashDiffusion { data, iterations } => {
                format!("{} bytes x {iterations} iterations", data.len())
            }
            WorkloadSpec::RayTrace {
                width,
                height,
                samples,
            } => format!("{width}x{height} samples={samples}"),
        }
    }

    /// Bytes of every input, for fingerprinting.
    pub fn input_bytes(&self) -> Vec<u8> {
        let mut out = self.algorithm().as_str().as_bytes().to_vec();
        match self {
            WorkloadSpec::MatrixMultiply { size, a, b } => {
                out.extend_from_slice(&(*size as u64).to_le_bytes());
                for v in a.iter().chain(b.iter()) {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            WorkloadSpec::Mandelbrot {
                width,
                height,
                viewport,
                max_iter,
            } => {
                out.extend_from_slice(&(*width as u64).to_le_bytes());
                out.extend_from_slice(&(*height as u64).to_le_bytes());
                for v in [viewport.xmin, viewport.xmax, viewport.ymin, viewport.ymax] {
                    out.extend_from_slice(&v.to_le_bytes());
                }
                out.extend_from_slice(&max_iter.to_le_bytes());
            }
            WorkloadSpec::HashDiffusion { data, iterations } => {
                out.extend_from_slice(data);
                out.extend_from_slice(&iterations.to_le_bytes());
            }
            WorkloadSpec::RayTrace {
                width,
                height,
                samples,
            } => {
                out.extend_from_slice(&(*width as u64).to_le_bytes());
                out.extend_from_slice(&(*height as u64).to_le_bytes());
                out.extend_from_slice(&samples.to_le_bytes());
            }
        }
        out
    }
}

/// Largest output buffer a workload may ask for, in bytes.
const MAX_OUTPUT_BYTES: usize = isize::MAX as usize;

/// Positive dimensions, and a `width * height * channels` buffer of 8-byte
/// elements that can be allocated.
fn check_raster(width: usize, height: usize, channels: usize) -> BenchResult<()> {
    if width == 0 || height == 0 {
        return Err(BenchError::InvalidWorkload(format!(
            "raster dimensions must be positive (got {width}x{height})"
        )));
    }
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .and_then(|n| n.checked_mul(8))
        .filter(|bytes| *bytes <= MAX_OUTPUT_BYTES)
        .map(|_| ())
        .ok_or_else(|| {
            BenchError::InvalidWorkload(format!("raster {width}x{height} is too large"))
        })
}

/// Sizes of the generated workloads. Every field has a default so config files
/// only need to name what they change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    pub seed: u64,
    pub matrix: MatrixConfig,
    pub mandelbrot: MandelbrotConfig,
    pub hash: HashConfig,
    pub ray_trace: RayTraceConfig,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        WorkloadConfig {
            seed: 42,
            matrix: MatrixConfig::default(),
            mandelbrot: MandelbrotConfig::default(),
            hash: HashConfig::default(),
            ray_trace: RayTraceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    pub size: usize,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        MatrixConfig { size: 128 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MandelbrotConfig {
    pub width: usize,
    pub height: usize,
    pub max_iter: u32,
    pub viewport: Viewport,
}

impl Default for MandelbrotConfig {
    fn default() -> Self {
        MandelbrotConfig {
            width: 256,
            height: 256,
            max_iter: 256,
            viewport: Viewport::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HashConfig {
    pub data_len: usize,
    pub iterations: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        HashConfig {
            data_len: 1024,
            iterations: 2048,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RayTraceConfig {
    pub width: usize,
    pub height: usize,
    pub samples: u32,
}

impl Default for RayTraceConfig {
    fn default() -> Self {
        RayTraceConfig {
            width: 128,
            height: 128,
            samples: 4,
        }
    }
}

/// Builds reproducible workloads from a [`WorkloadConfig`].
pub struct WorkloadFactory {
    config: WorkloadConfig,
}

impl WorkloadFactory {
    pub fn new(config: WorkloadConfig) -> Self {
        WorkloadFactory { config }
    }

    /// Build the workload for one algorithm. Inputs depend only on the seed.
    pub fn build(&self, algorithm: Algorithm) -> WorkloadSpec {
        let cfg = &self.config;
        match algorithm {
            Algorithm::MatrixMultiply => {
                let mut rng = StdRng::seed_from_u64(cfg.seed);
                let n = cfg.matrix.size;
                // An unallocatable size gets empty operands, which validation rejects.
                let len = n
                    .checked_mul(n)
                    .filter(|len| len.checked_mul(8).is_some_and(|b| b <= MAX_OUTPUT_BYTES))
                    .unwrap_or(0);
                let a = (0..len).map(|_| rng.random::<f64>()).collect();
                let b = (0..len).map(|_| rng.random::<f64>()).collect();
                WorkloadSpec::MatrixMultiply { size: n, a, b }
            }
            Algorithm::Mandelbrot => WorkloadSpec::Mandelbrot {
                width: cfg.mandelbrot.width,
                height: cfg.mandelbrot.height,
                viewport: cfg.mandelbrot.viewport,
                max_iter: cfg.mandelbrot.max_iter,
            },
            Algorithm::HashDiffusion => {
                let mut rng = StdRng::seed_from_u64(cfg.seed.wrapping_add(1));
                let data = (0..cfg.hash.data_len).map(|_| rng.random::<u8>()).collect();
                WorkloadSpec::HashDiffusion {
                    data,
                    iterations: cfg.hash.iterations,
                }
            }
            Algorithm::RayTrace => WorkloadSpec::RayTrace {
                width: cfg.ray_trace.width,
                height: cfg.ray_trace.height,
                samples: cfg.ray_trace.samples,
            },
        }
    }

    pub fn build_all(&self, algorithms: &[Algorithm]) -> Vec<WorkloadSpec> {
        algorithms.iter().map(|a| self.build(*a)).collect()
    }
}

/// Fingerprint of all workload inputs.
pub fn inputs_fingerprint(workloads: &[WorkloadSpec]) -> String {
    let bytes: Vec<u8> = workloads.iter().flat_map(|w| w.input_bytes()).collect();
    crate::sha256_hex(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_rejects_zero_size_and_bad_lengths() {
        let zero = WorkloadSpec::MatrixMultiply {
            size: 0,
            a: vec![],
            b: vec![],
        };
        assert!(matches!(zero.validate(), Err(BenchError::InvalidWorkload(_))));

        let short = WorkloadSpec::MatrixMultiply {
            size: 2,
            a: vec![1.0; 4],
            b: vec![1.0; 3],
        };
        assert!(matches!(short.validate(), Err(BenchError::InvalidWorkload(_))));
    }

    #[test]
    fn test_viewport_allows_degenerate_but_not_inverted() {
        let point = WorkloadSpec::Mandelbrot {
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
        assert!(point.validate().is_ok());

        let inverted = WorkloadSpec::Mandelbrot {
            width: 4,
            height: 4,
            viewport: Viewport {
                xmin: 1.0,
                xmax: -1.0,
                ymin: 0.0,
                ymax: 1.0,
            },
            max_iter: 10,
        };
        assert!(matches!(inverted.validate(), Err(BenchError::InvalidWorkload(_))));

        let nan = WorkloadSpec::Mandelbrot {
            width: 4,
            height: 4,
            viewport: Viewport {
                xmin: f64::NAN,
                ..Viewport::default()
            },
            max_iter: 10,
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_zero_counts_are_rejected() {
        let mandel = WorkloadSpec::Mandelbrot {
            width: 4,
            height: 4,
            viewport: Viewport::default(),
            max_iter: 0,
        };
        assert!(mandel.validate().is_err());

        let rays = WorkloadSpec::RayTrace {
            width: 4,
            height: 0,
            samples: 1,
        };
        assert!(rays.validate().is_err());

        let hash = WorkloadSpec::HashDiffusion {
            data: vec![],
            iterations: 0,
        };
        assert!(hash.validate().is_ok());
        assert_eq!(hash.unit_count(), 0);
    }

    #[test]
    fn test_oversized_rasters_are_rejected() {
        let mandel = WorkloadSpec::Mandelbrot {
            width: 1 << 32,
            height: 1 << 32,
            viewport: Viewport::default(),
            max_iter: 10,
        };
        assert!(matches!(mandel.validate(), Err(BenchError::InvalidWorkload(_))));

        // width * height fits, width * 3 does not
        let rays = WorkloadSpec::RayTrace {
            width: usize::MAX / 3 + 1,
            height: 1,
            samples: 1,
        };
        assert!(matches!(rays.validate(), Err(BenchError::InvalidWorkload(_))));

        let tall = WorkloadSpec::RayTrace {
            width: 1 << 20,
            height: 1 << 40,
            samples: 1,
        };
        assert!(tall.validate().is_err());
    }

    #[test]
    fn test_output_len_follows_parameters() {
        let rays = WorkloadSpec::RayTrace {
            width: 5,
            height: 3,
            samples: 1,
        };
        assert_eq!(rays.output_len(), 5 * 3 * 3);

        let hash = WorkloadSpec::HashDiffusion {
            data: vec![1, 2, 3],
            iterations: HASH_BLOCK as u32 * 2 + 1,
        };
        assert_eq!(hash.unit_count(), 3);
        assert_eq!(hash.output_len(), 3);
    }

    #[test]
    fn test_factory_oversized_matrix_fails_validation() {
        let factory = WorkloadFactory::new(WorkloadConfig {
            matrix: MatrixConfig { size: 1 << 40 },
            ..WorkloadConfig::default()
        });
        let workload = factory.build(Algorithm::MatrixMultiply);
        assert!(matches!(workload.validate(), Err(BenchError::InvalidWorkload(_))));
    }

    #[test]
    fn test_factory_is_reproducible() {
        let factory = WorkloadFactory::new(WorkloadConfig {
            matrix: MatrixConfig { size: 8 },
            ..WorkloadConfig::default()
        });
        let first = factory.build(Algorithm::MatrixMultiply);
        let second = factory.build(Algorithm::MatrixMultiply);
        assert_eq!(first, second);
        assert!(first.validate().is_ok());
        assert_eq!(
            inputs_fingerprint(&[first.clone()]),
            inputs_fingerprint(&[second])
        );
    }
}
