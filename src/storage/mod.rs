//! Storage layer for benchmark records.
//!
//! Run records are kept in an append-only JSONL log and flattened to CSV on export.

pub mod csv;
pub mod jsonl;

pub use csv::{CSV_HEADERS, CsvExporter};
pub use jsonl::{RecordFilter, RecordLog, Records};
