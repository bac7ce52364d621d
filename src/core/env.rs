//! Host description stored with every run record.
//!
//! Only what the reports render or what explains a speedup is captured: the CPU
//! and how many threads the parallel variant could use, the memory size, and
//! the commit that was measured.

use std::process::Command;

use serde::{Deserialize, Serialize};
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    /// `os/arch`, e.g. `linux/x86_64`.
    pub platform: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_model: Option<String>,

    /// Threads the OS lets this process run in parallel.
    pub parallelism: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_ram_bytes: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitState>,

    pub crate_version: String,
}

/// Commit of the working tree a run was measured on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitState {
    pub sha: String,
    pub dirty: bool,
}

impl GitState {
    /// Short sha with a `+dirty` marker, as shown in reports.
    pub fn label(&self) -> String {
        let short = self.sha.get(..12).unwrap_or(&self.sha);
        if self.dirty {
            format!("{short}+dirty")
        } else {
            short.to_string()
        }
    }
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        EnvironmentInfo {
            platform: platform(),
            cpu_model: None,
            parallelism: 1,
            total_ram_bytes: None,
            git: None,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl EnvironmentInfo {
    pub fn detect() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::new())
                .with_memory(MemoryRefreshKind::new().with_ram()),
        );
        let cpu_model = sys
            .cpus()
            .first()
            .map(|c| c.brand().trim().to_string())
            .filter(|b| !b.is_empty());
        let total_ram_bytes = Some(sys.total_memory()).filter(|b| *b > 0);

        EnvironmentInfo {
            platform: platform(),
            cpu_model,
            parallelism: default_workers(),
            total_ram_bytes,
            git: detect_git(),
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// One line for terminal headers.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} on {}, {} threads",
            self.cpu_model.as_deref().unwrap_or("unknown cpu"),
            self.platform,
            self.parallelism
        );
        if let Some(git) = &self.git {
            line.push_str(&format!(", commit {}", git.label()));
        }
        line
    }
}

/// Worker count to use when none is configured.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn platform() -> String {
    format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH)
}

fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
}

fn detect_git() -> Option<GitState> {
    let sha = git(&["rev-parse", "HEAD"])?.trim().to_string();
    if sha.is_empty() {
        return None;
    }
    let dirty = git(&["status", "--porcelain"]).is_some_and(|s| !s.trim().is_empty());
    Some(GitState { sha, dirty })
}
