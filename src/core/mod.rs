//! Core types and schemas for triad-bench.
//!
//! This module contains the workload model and the canonical `RunRecord` schema (v1)
//! used for all benchmark outputs.

pub mod env;
pub mod schema;
pub mod workload;

// Re-export key types for convenience
pub use env::{EnvironmentInfo, GitState, default_workers};
pub use schema::{
    Algorithm, ComparisonResult, EntryStatus, RunConfig, RunRecord, SCHEMA_VERSION,
    TimingSample, TimingStat, Variant, VariantResult, speedup,
};
pub use workload::{Viewport, WorkloadConfig, WorkloadFactory, WorkloadSpec, inputs_fingerprint};
