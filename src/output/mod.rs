//! Output module for extraction results
//!
//! This module handles:
//! - The record type produced for every work item
//! - The `ResultSink` interface the orchestrator writes through
//! - The append-only CSV results file

mod csv_sink;
mod normalize;
mod traits;

pub use csv_sink::CsvSink;
pub use normalize::transliterate;
pub use traits::{
    ExtractionResult, Field, Fields, OutputError, OutputResult, ResultSink, COLUMNS,
};
