//! Crawler module for per-item fetching and the sweep loop
//!
//! This module contains the work-processing core, including:
//! - HTTP fetching of search results and profile pages
//! - Best-effort field extraction from profile HTML
//! - Block detection on response signals
//! - The per-item pipeline and the orchestrating work loop

mod block;
mod coordinator;
mod fetcher;
mod parser;
mod processor;

pub use block::{BlockDetector, PageSignals};
pub use coordinator::{run_sweep, Orchestrator, RunSummary};
pub use fetcher::{build_http_client, ContentFetcher, FetchError, FetchedPage, HttpFetcher, Located};
pub use parser::{ExtractionError, Extractor, ProfileExtractor};
pub use processor::{ProcessOutcome, WorkProcessor};
