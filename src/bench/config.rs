use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Algorithm, Variant, WorkloadConfig};
use crate::{BenchError, BenchResult};

/// `[run]` section: harness settings. Unset fields fall back to CLI flags or
/// built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    pub iterations: Option<usize>,
    pub warmup: Option<usize>,
    pub workers: Option<usize>,
    pub yield_ms: Option<u64>,
    pub algorithms: Option<Vec<Algorithm>>,
    pub variants: Option<Vec<Variant>>,
}

/// A benchmark suite file.
///
/// ```toml
/// name = "nightly"
///
/// [run]
/// iterations = 10
/// workers = 8
///
/// [workloads.matrix]
/// size = 256
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    pub name: Option<String>,
    pub run: RunSection,
    pub workloads: WorkloadConfig,
}

impl SuiteConfig {
    /// Suite name: explicit `name`, else the file stem, else "default".
    pub fn suite_name(&self, path: Option<&Path>) -> String {
        self.name
            .clone()
            .or_else(|| {
                path.and_then(|p| p.file_stem())
                    .map(|s| s.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "default".to_string())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

pub fn parse_suite_config(s: &str, yaml: bool) -> BenchResult<SuiteConfig> {
    if yaml {
        serde_yaml::from_str(s).map_err(|e| BenchError::Message(format!("invalid YAML suite: {e}")))
    } else {
        toml::from_str(s).map_err(|e| BenchError::Message(format!("invalid TOML suite: {e}")))
    }
}

/// Load a suite file; `.yaml`/`.yml` are read as YAML, everything else as TOML.
pub fn load_suite_config(path: &Path) -> BenchResult<SuiteConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| BenchError::Message(format!("failed to read {}: {e}", path.display())))?;
    parse_suite_config(&s, is_yaml(path))
}
