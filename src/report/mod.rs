//! Reporting module for benchmark results.
//!
//! This module provides:
//! - `ReportRow`: flat `{algorithm, variant, meanTimeMs, speedupVsBaseline}` rows
//! - Plain-text tables for the terminal
//! - Markdown rendering for run records, and writing it to a file

pub mod comparison;

pub use comparison::{
    ReportRow, format_bytes, format_ms, format_speedup, render_markdown, render_table,
    report_rows, write_markdown,
};
