//! Run history as JSON Lines: one `RunRecord` per suite run, oldest first.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Lines, Write};
use std::path::{Path, PathBuf};

use crate::core::schema::{Algorithm, RunRecord, SCHEMA_VERSION, Variant};
use crate::{BenchError, BenchResult};

/// Selects records, and the parts of each record, that `show` renders.
///
/// A record passes when its suite matches. Its comparisons are then pruned to
/// the requested algorithm and variant; a record left with no comparisons is
/// dropped when either of those was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub suite: Option<String>,
    pub algorithm: Option<Algorithm>,
    pub variant: Option<Variant>,
}

impl RecordFilter {
    pub fn suite(name: impl Into<String>) -> Self {
        RecordFilter {
            suite: Some(name.into()),
            ..RecordFilter::default()
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }

    fn narrows_results(&self) -> bool {
        self.algorithm.is_some() || self.variant.is_some()
    }

    /// The part of `record` this filter keeps, if any.
    pub fn apply(&self, mut record: RunRecord) -> Option<RunRecord> {
        if self.suite.as_deref().is_some_and(|s| s != record.suite_name) {
            return None;
        }
        if !self.narrows_results() {
            return Some(record);
        }
        record.results.retain(|cmp| self.algorithm.is_none_or(|a| a == cmp.algorithm));
        if let Some(variant) = self.variant {
            for cmp in &mut record.results {
                cmp.variants.retain(|v| v.variant == variant);
            }
            record.results.retain(|cmp| !cmp.variants.is_empty());
        }
        (!record.results.is_empty()).then_some(record)
    }
}

/// Append-only record file.
#[derive(Debug, Clone)]
pub struct RecordLog {
    path: PathBuf,
}

impl RecordLog {
    /// The file is only created on the first append.
    pub fn open(path: impl AsRef<Path>) -> Self {
        RecordLog {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Append one record, creating the file and its directory as needed.
    ///
    /// Records written by another schema version are refused.
    pub fn append(&self, record: &RunRecord) -> BenchResult<()> {
        if record.schema_version != SCHEMA_VERSION {
            return Err(BenchError::Message(format!(
                "schema version mismatch: record has v{}, expected v{}",
                record.schema_version, SCHEMA_VERSION
            )));
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                BenchError::Message(format!("failed to create {}: {e}", dir.display()))
            })?;
        }

        let line = serde_json::to_string(record)
            .map_err(|e| BenchError::Message(format!("failed to serialize record: {e}")))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{line}").map_err(|e| self.io_error(e))
    }

    /// Stream every record in file order.
    pub fn records(&self) -> BenchResult<Records> {
        if !self.path.exists() {
            return Err(BenchError::Message(format!(
                "file not found: {}",
                self.path.display()
            )));
        }
        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        Ok(Records {
            lines: BufReader::new(file).lines(),
            line: 0,
        })
    }

    /// Every record, or the part of it, that `filter` keeps.
    pub fn read(&self, filter: &RecordFilter) -> BenchResult<Vec<RunRecord>> {
        let mut kept = Vec::new();
        for record in self.records()? {
            if let Some(record) = filter.apply(record?) {
                kept.push(record);
            }
        }
        Ok(kept)
    }

    /// The newest record `filter` keeps. A missing file has none.
    pub fn latest(&self, filter: &RecordFilter) -> BenchResult<Option<RunRecord>> {
        if !self.exists() {
            return Ok(None);
        }
        Ok(self.read(filter)?.pop())
    }

    /// Number of stored records; zero when the file does not exist yet.
    pub fn count(&self) -> BenchResult<usize> {
        if !self.exists() {
            return Ok(0);
        }
        self.records()?.try_fold(0, |n, r| r.map(|_| n + 1))
    }

    fn io_error(&self, e: std::io::Error) -> BenchError {
        BenchError::Message(format!("{}: {e}", self.path.display()))
    }
}

/// Iterator over the records of a `RecordLog`. Blank lines are skipped; a
/// malformed line is reported with its 1-based line number.
pub struct Records {
    lines: Lines<BufReader<File>>,
    line: usize,
}

impl Iterator for Records {
    type Item = BenchResult<RunRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = self.lines.next()?;
            self.line += 1;
            let text = match text {
                Ok(text) => text,
                Err(e) => {
                    return Some(Err(BenchError::Message(format!(
                        "failed to read line {}: {e}",
                        self.line
                    ))));
                }
            };
            if text.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&text).map_err(|e| {
                BenchError::Message(format!("failed to parse line {}: {e}", self.line))
            }));
        }
    }
}
