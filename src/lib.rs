pub mod bench;
pub mod boundary;
pub mod core;
pub mod engine;
pub mod interp;
pub mod kernels;
pub mod report;
pub mod storage;

use thiserror::Error;

pub use crate::core::{Algorithm, Variant, WorkloadSpec};
pub use crate::storage::{RecordFilter, RecordLog};

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("invalid workload: {0}")]
    InvalidWorkload(String),
    #[error("runtime not ready: {0}")]
    NotReady(String),
    #[error("partition {partition} failed: {reason}")]
    PartitionFailure { partition: usize, reason: String },
    #[error("missing variant: {0}")]
    MissingVariant(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("unknown callable '{0}'")]
    UnknownCallable(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type BenchResult<T> = Result<T, BenchError>;

// Shared helpers
pub fn now_string() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha256::digest;
    digest(bytes)
}

/// Used memory of the host in bytes, sampled once.
#[cfg(feature = "mem")]
pub fn capture_used_memory() -> Option<u64> {
    use sysinfo::{MemoryRefreshKind, RefreshKind, System};
    let mut sys = System::new_with_specifics(
        RefreshKind::new().with_memory(MemoryRefreshKind::new().with_ram()),
    );
    sys.refresh_memory();
    Some(sys.total_memory().saturating_sub(sys.free_memory()))
}

#[cfg(not(feature = "mem"))]
pub fn capture_used_memory() -> Option<u64> {
    None
}
