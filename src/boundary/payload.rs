//! Typed payloads and outputs crossing the runtime boundary.

use serde::{Deserialize, Serialize};

use crate::core::{Algorithm, Viewport, WorkloadSpec};
use crate::{BenchError, BenchResult};

/// Serialized call arguments, tagged by algorithm:
///
/// ```json
/// {"algorithm": "mandelbrot", "width": 64, "height": 48,
///  "xmin": -2.0, "xmax": 1.0, "ymin": -1.5, "ymax": 1.5, "max_iter": 100}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm")]
pub enum Payload {
    #[serde(rename = "matrix_multiply")]
    Matrix {
        a: Vec<f64>,
        b: Vec<f64>,
        size: usize,
    },
    #[serde(rename = "mandelbrot")]
    Mandelbrot {
        width: usize,
        height: usize,
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
        max_iter: u32,
    },
    #[serde(rename = "hash_diffusion")]
    Hash { data: Vec<u8>, iterations: u32 },
    #[serde(rename = "ray_trace")]
    RayTrace {
        width: usize,
        height: usize,
        samples: u32,
    },
}

impl Payload {
    pub fn decode_json(s: &str) -> BenchResult<Payload> {
        serde_json::from_str(s).map_err(|e| BenchError::InvalidPayload(e.to_string()))
    }

    pub fn to_json(&self) -> BenchResult<String> {
        serde_json::to_string(self).map_err(|e| BenchError::Message(e.to_string()))
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Payload::Matrix { .. } => Algorithm::MatrixMultiply,
            Payload::Mandelbrot { .. } => Algorithm::Mandelbrot,
            Payload::Hash { .. } => Algorithm::HashDiffusion,
            Payload::RayTrace { .. } => Algorithm::RayTrace,
        }
    }

    /// Check shapes, then build and validate the workload.
    pub fn into_workload(self) -> BenchResult<WorkloadSpec> {
        let workload = match self {
            Payload::Matrix { a, b, size } => {
                let expected = size.checked_mul(size).ok_or_else(|| {
                    BenchError::InvalidPayload(format!("matrix size {size} overflows"))
                })?;
                if a.len() != expected || b.len() != expected {
                    return Err(BenchError::InvalidPayload(format!(
                        "matrix operands must hold {expected} elements (got a={}, b={})",
                        a.len(),
                        b.len()
                    )));
                }
                WorkloadSpec::MatrixMultiply { size, a, b }
            }
            Payload::Mandelbrot {
                width,
                height,
                xmin,
                xmax,
                ymin,
                ymax,
                max_iter,
            } => WorkloadSpec::Mandelbrot {
                width,
                height,
                viewport: Viewport {
                    xmin,
                    xmax,
                    ymin,
                    ymax,
                },
                max_iter,
            },
            Payload::Hash { data, iterations } => WorkloadSpec::HashDiffusion { data, iterations },
            Payload::RayTrace {
                width,
                height,
                samples,
            } => WorkloadSpec::RayTrace {
                width,
                height,
                samples,
            },
        };
        workload.validate()?;
        Ok(workload)
    }

    pub fn from_workload(workload: &WorkloadSpec) -> Payload {
        match workload {
            WorkloadSpec::MatrixMultiply { size, a, b } => Payload::Matrix {
                a: a.clone(),
                b: b.clone(),
                size: *size,
            },
            WorkloadSpec::Mandelbrot {
                width,
                height,
                viewport,
                max_iter,
            } => Payload::Mandelbrot {
                width: *width,
                height: *height,
                xmin: viewport.xmin,
                xmax: viewport.xmax,
                ymin: viewport.ymin,
                ymax: viewport.ymax,
                max_iter: *max_iter,
            },
            WorkloadSpec::HashDiffusion { data, iterations } => Payload::Hash {
                data: data.clone(),
                iterations: *iterations,
            },
            WorkloadSpec::RayTrace {
                width,
                height,
                samples,
            } => Payload::RayTrace {
                width: *width,
                height: *height,
                samples: *samples,
            },
        }
    }
}

/// Result buffer of a call. Arrays are moved across, never converted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum Output {
    F64(Vec<f64>),
    U32(Vec<u32>),
    Hash(u32),
}

impl Output {
    pub fn len(&self) -> usize {
        match self {
            Output::F64(v) => v.len(),
            Output::U32(v) => v.len(),
            Output::Hash(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One-line description for terminal output.
    pub fn summary(&self) -> String {
        match self {
            Output::F64(v) if v.is_empty() => "f64[0]".to_string(),
            Output::F64(v) => {
                let min = v.iter().copied().fold(f64::INFINITY, f64::min);
                let max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = v.iter().sum::<f64>() / v.len() as f64;
                format!("f64[{}] min={min:.6} max={max:.6} mean={mean:.6}", v.len())
            }
            Output::U32(v) => {
                let max = v.iter().max().copied().unwrap_or(0);
                let sum: u64 = v.iter().map(|x| u64::from(*x)).sum();
                format!("u32[{}] max={max} sum={sum}", v.len())
            }
            Output::Hash(h) => format!("hash=0x{h:08x} ({h})"),
        }
    }
}
