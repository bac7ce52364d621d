//! The closed set of externally visible entry points.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{Algorithm, Variant};
use crate::BenchError;

/// One algorithm in one execution mode, e.g. `mandelbrotCompiledParallel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Callable {
    pub algorithm: Algorithm,
    pub variant: Variant,
}

impl Callable {
    pub const fn new(algorithm: Algorithm, variant: Variant) -> Self {
        Callable { algorithm, variant }
    }

    /// All twelve callables, algorithm-major.
    pub fn all() -> Vec<Callable> {
        Algorithm::ALL
            .into_iter()
            .flat_map(|a| Variant::ALL.into_iter().map(move |v| Callable::new(a, v)))
            .collect()
    }

    /// Callables served by a compiled runtime.
    pub fn compiled() -> Vec<Callable> {
        Self::all()
            .into_iter()
            .filter(|c| c.variant.requires_runtime())
            .collect()
    }

    pub fn name(&self) -> String {
        format!(
            "{}{}",
            self.algorithm.callable_prefix(),
            self.variant.callable_suffix()
        )
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Callable {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| BenchError::UnknownCallable(s.to_string()))
    }
}

impl TryFrom<String> for Callable {
    type Error = BenchError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Callable> for String {
    fn from(c: Callable) -> Self {
        c.name()
    }
}
