//! Durable storage of the comparison dataset.
//!
//! The JSON file is the source of truth for the next run; the CSV is a rendering of
//! the same rows for spreadsheets. Both are replaced atomically: each is written in full
//! to a temporary file in the output directory, and only once both are staged are
//! they renamed over their targets.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use spreadwatch_core::types::ts_format;
use spreadwatch_core::{ComparisonRow, Decimal, OutputConfig, SpreadError};
use tempfile::NamedTempFile;

/// Column order of the tabular output.
pub const CSV_HEADER: [&str; 6] = [
    "ts_utc",
    "source_a_close",
    "source_b_close",
    "abs_diff",
    "diff_pct",
    "updated_at_utc",
];

/// Load and save the rolling dataset.
pub trait DatasetStore: Send + Sync {
    /// Load the previously persisted dataset.
    ///
    /// A missing dataset is empty. Content that cannot be parsed is also treated as
    /// empty, since the next save replaces it.
    ///
    /// # Errors
    /// Returns `Persistence` when existing data cannot be read.
    fn load(&self) -> Result<Vec<ComparisonRow>, SpreadError>;

    /// Replace the persisted dataset with `rows`.
    ///
    /// # Errors
    /// Returns `Persistence` when any output cannot be written.
    fn save(&self, rows: &[ComparisonRow]) -> Result<(), SpreadError>;
}

/// CSV + JSON files under one output directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    output: OutputConfig,
}

impl FileStore {
    /// Store writing `<dir>/<stem>.csv` and `<dir>/<stem>.json`.
    #[must_use]
    pub const fn new(output: OutputConfig) -> Self {
        Self { output }
    }

    /// Path of the tabular output.
    #[must_use]
    pub fn csv_path(&self) -> PathBuf {
        self.output.csv_path()
    }

    /// Path of the structured output.
    #[must_use]
    pub fn json_path(&self) -> PathBuf {
        self.output.json_path()
    }
}

fn persistence(action: &str, path: &Path, e: impl std::fmt::Display) -> SpreadError {
    SpreadError::Persistence(format!("{action} {}: {e}", path.display()))
}

fn cell(v: Option<Decimal>) -> String {
    v.map(|d| d.normalize().to_string()).unwrap_or_default()
}

/// Write a complete file next to its final location without exposing it yet.
fn stage<F>(dir: &Path, write: F) -> Result<NamedTempFile, SpreadError>
where
    F: FnOnce(&mut File) -> Result<(), SpreadError>,
{
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| persistence("create temp file in", dir, e))?;
    write(tmp.as_file_mut())?;
    tmp.as_file_mut()
        .sync_all()
        .map_err(|e| persistence("sync", tmp.path(), e))?;
    Ok(tmp)
}

fn publish(tmp: NamedTempFile, target: &Path) -> Result<(), SpreadError> {
    tmp.persist(target)
        .map_err(|e| persistence("replace", target, e.error))?;
    Ok(())
}

fn write_csv(file: &mut File, rows: &[ComparisonRow], path: &Path) -> Result<(), SpreadError> {
    let mut w = csv::Writer::from_writer(file);
    w.write_record(CSV_HEADER)
        .map_err(|e| persistence("write", path, e))?;
    for row in rows {
        w.write_record([
            ts_format::format(&row.minute),
            cell(row.source_a_close),
            cell(row.source_b_close),
            cell(row.absolute_diff),
            cell(row.percent_diff),
            ts_format::format(&row.last_updated),
        ])
        .map_err(|e| persistence("write", path, e))?;
    }
    w.flush().map_err(|e| persistence("flush", path, e))
}

fn write_json(file: &mut File, rows: &[ComparisonRow], path: &Path) -> Result<(), SpreadError> {
    let mut out = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, rows).map_err(|e| persistence("write", path, e))?;
    out.write_all(b"\n")
        .and_then(|()| out.flush())
        .map_err(|e| persistence("write", path, e))
}

impl DatasetStore for FileStore {
    fn load(&self) -> Result<Vec<ComparisonRow>, SpreadError> {
        let path = self.json_path();
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(persistence("read", &path, e)),
        };
        match serde_json::from_slice::<Vec<ComparisonRow>>(&bytes) {
            Ok(rows) => Ok(rows),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    path = %path.display(),
                    error = %_e,
                    "previous dataset is unreadable; starting from empty"
                );
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, rows: &[ComparisonRow]) -> Result<(), SpreadError> {
        let dir = &self.output.dir;
        fs::create_dir_all(dir).map_err(|e| persistence("create", dir, e))?;

        // Both files are fully staged before either replaces its target.
        let csv_path = self.csv_path();
        let json_path = self.json_path();
        let csv_tmp = stage(dir, |f| write_csv(f, rows, &csv_path))?;
        let json_tmp = stage(dir, |f| write_json(f, rows, &json_path))?;
        publish(json_tmp, &json_path)?;
        publish(csv_tmp, &csv_path)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(rows = rows.len(), dir = %dir.display(), "dataset saved");
        Ok(())
    }
}
