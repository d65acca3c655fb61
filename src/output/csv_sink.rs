//! Append-only CSV result file
//!
//! Every append opens the file in append mode, writes one row and flushes,
//! so a crash loses at most the row being written. The header goes in only
//! when the file is new or empty; earlier rows are never rewritten.

use crate::output::normalize::transliterate;
use crate::output::traits::{
    ExtractionResult, Field, OutputError, OutputResult, ResultSink, COLUMNS,
};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CSV implementation of `ResultSink`
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    transliterate: bool,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            transliterate: false,
        }
    }

    /// Replace diacritics in text columns before writing
    pub fn with_transliteration(mut self, enabled: bool) -> Self {
        self.transliterate = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads back every record in the file
    ///
    /// A missing file reads as no records.
    pub fn read_all(&self) -> OutputResult<Vec<ExtractionResult>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let mut results = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut result = ExtractionResult::empty(record.get(0).unwrap_or_default());
            for (i, field) in Field::ALL.iter().enumerate() {
                if let Some(value) = record.get(i + 1) {
                    *result.fields.get_mut(*field) = value.to_string();
                }
            }
            results.push(result);
        }
        Ok(results)
    }

    /// Keys that already have a row in the file
    pub fn completed_keys(&self) -> OutputResult<HashSet<String>> {
        Ok(self.read_all()?.into_iter().map(|r| r.key).collect())
    }

    fn needs_header(&self) -> OutputResult<bool> {
        match std::fs::metadata(&self.path) {
            Ok(metadata) => Ok(metadata.len() == 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> OutputError {
        OutputError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl ResultSink for CsvSink {
    fn append(&mut self, result: &ExtractionResult) -> OutputResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let needs_header = self.needs_header()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(COLUMNS)?;
        }

        if self.transliterate {
            let mut normalized = result.clone();
            for field in Field::ALL.iter().filter(|f| f.is_text()) {
                let value = normalized.fields.get_mut(*field);
                *value = transliterate(value);
            }
            writer.write_record(normalized.row())?;
        } else {
            writer.write_record(result.row())?;
        }

        writer.flush().map_err(|e| self.io_error(e))?;
        debug!("Appended result for {} to {}", result.key, self.path.display());
        Ok(())
    }
}
