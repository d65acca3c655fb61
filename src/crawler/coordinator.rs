//! Sweep coordinator - main work loop
//!
//! This module drives a sweep over the work items:
//! - Establishing the initial egress identity
//! - Rotating on a fixed cadence and when the target blocks us
//! - Retrying a blocked item once on the new identity
//! - Appending exactly one result per finished item
//! - Honouring cancellation and always releasing the egress path

use crate::config::Config;
use crate::crawler::block::BlockDetector;
use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::parser::ProfileExtractor;
use crate::crawler::processor::{ProcessOutcome, WorkProcessor};
use crate::egress::{CliEgress, EgressController, EgressSettings, RotationCause};
use crate::identity::IdentityPool;
use crate::input::{load_items, without_completed, WorkItem};
use crate::output::{CsvSink, ExtractionResult, ResultSink};
use crate::state::RotationStateStore;
use crate::{ConfigError, SweepError};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Counters for a finished (or interrupted) sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Items with a row written
    pub processed: usize,
    /// Rows with at least one non-empty field
    pub with_data: usize,
    /// Block signals seen, retries included
    pub blocks: usize,
    pub scheduled_rotations: usize,
    pub forced_rotations: usize,
    pub rotation_failures: usize,
    /// The run stopped early on request
    pub cancelled: bool,
}

/// Main sweep orchestrator
pub struct Orchestrator {
    controller: EgressController,
    processor: WorkProcessor,
    sink: Box<dyn ResultSink>,
    item_delay: Duration,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        controller: EgressController,
        processor: WorkProcessor,
        sink: Box<dyn ResultSink>,
    ) -> Self {
        Self {
            controller,
            processor,
            sink,
            item_delay: Duration::ZERO,
            cancel: CancellationToken::new(),
        }
    }

    /// Pause between consecutive items
    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    /// Token that stops the sweep when cancelled
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn controller(&self) -> &EgressController {
        &self.controller
    }

    /// Runs the sweep over `items`, rotating after every `rotate_every` items
    ///
    /// The egress path is released however the run ends. Only configuration
    /// problems, a failed initial connection and a failed result write end
    /// the run with an error.
    pub async fn run(
        &mut self,
        items: &[WorkItem],
        rotate_every: usize,
    ) -> Result<RunSummary, SweepError> {
        if self.controller.pool().is_empty() {
            return Err(ConfigError::EmptyCatalog.into());
        }
        if rotate_every == 0 {
            return Err(ConfigError::Validation("rotate-every must be at least 1".to_string()).into());
        }

        let mut summary = RunSummary::default();
        let cancel = self.cancel.clone();

        let initial = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.controller.connect_initial() => Some(result),
        };
        match initial {
            None => {
                tracing::info!("Cancelled before the first identity was established");
                self.controller.release().await;
                summary.cancelled = true;
                return Ok(summary);
            }
            Some(Ok(event)) => tracing::info!("{}", event),
            Some(Err(e)) => {
                tracing::error!("Could not establish the initial identity: {}", e);
                self.controller.release().await;
                return Err(SweepError::Initialization(e));
            }
        }

        let result = self.work(items, rotate_every, &mut summary).await;
        self.controller.release().await;

        if self.controller.persistence_failures() > 0 {
            tracing::warn!(
                "{} rotation state saves failed during this run",
                self.controller.persistence_failures()
            );
        }
        result.map(|()| summary)
    }

    async fn work(
        &mut self,
        items: &[WorkItem],
        rotate_every: usize,
        summary: &mut RunSummary,
    ) -> Result<(), SweepError> {
        let total = items.len();
        let cancel = self.cancel.clone();
        let start_time = Instant::now();

        for (position, item) in items.iter().enumerate() {
            let i = position + 1;
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            if i > 1 && (i - 1) % rotate_every == 0 {
                tracing::info!("Scheduled rotation after {} items", rotate_every);
                let rotated = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => false,
                    _ = self.rotate(RotationCause::Scheduled, summary) => true,
                };
                if !rotated {
                    summary.cancelled = true;
                    break;
                }
            }

            tracing::info!(
                "[{}/{}] {} via {}",
                i,
                total,
                item.key,
                self.controller
                    .current_identity()
                    .map(|id| id.name().to_string())
                    .unwrap_or_default()
            );

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.process_with_retry(item, summary) => Some(result),
            };
            let Some(result) = outcome else {
                tracing::info!("Cancelled while processing {}, not recorded", item.key);
                summary.cancelled = true;
                break;
            };

            self.sink.append(&result)?;
            summary.processed += 1;
            if result.has_data() {
                summary.with_data += 1;
                tracing::info!("Saved {} ({} with data so far)", item.key, summary.with_data);
            } else {
                tracing::info!("Saved empty record for {}", item.key);
            }

            if i % 10 == 0 {
                tracing::info!(
                    "Progress: {}/{} items in {:?}, {} blocks, {} rotation failures",
                    i,
                    total,
                    start_time.elapsed(),
                    summary.blocks,
                    summary.rotation_failures
                );
            }

            if i < total && !self.item_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        summary.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.item_delay) => {}
                }
            }
        }

        if summary.cancelled {
            tracing::info!(
                "Sweep cancelled after {} of {} items",
                summary.processed,
                total
            );
        } else {
            tracing::info!(
                "Sweep completed: {} items in {:?}",
                summary.processed,
                start_time.elapsed()
            );
        }
        Ok(())
    }

    /// Processes an item, rotating and retrying once if it was blocked
    async fn process_with_retry(
        &mut self,
        item: &WorkItem,
        summary: &mut RunSummary,
    ) -> ExtractionResult {
        let location = match self.processor.process(item).await {
            ProcessOutcome::Completed(result) => return result,
            ProcessOutcome::Blocked { location } => location,
        };

        summary.blocks += 1;
        tracing::warn!("Identity blocked at {}, forcing a rotation", location);
        self.rotate(RotationCause::Blocked, summary).await;

        match self.processor.process(item).await {
            ProcessOutcome::Completed(result) => result,
            ProcessOutcome::Blocked { location } => {
                summary.blocks += 1;
                tracing::warn!(
                    "Still blocked at {} after rotating, recording {} as empty",
                    location,
                    item.key
                );
                ExtractionResult::empty(&item.key)
            }
        }
    }

    /// Rotates; a failure is logged and the run continues on the current identity
    async fn rotate(&mut self, cause: RotationCause, summary: &mut RunSummary) {
        match self.controller.rotate(cause).await {
            Ok(event) => {
                tracing::info!("{}", event);
                match cause {
                    RotationCause::Blocked => summary.forced_rotations += 1,
                    _ => summary.scheduled_rotations += 1,
                }
            }
            Err(e) => {
                summary.rotation_failures += 1;
                tracing::error!(
                    "{} rotation failed, continuing on the current identity: {}",
                    cause,
                    e
                );
            }
        }
    }
}

/// Runs a complete sweep from configuration
///
/// This is the main entry point. It will:
/// 1. Build the identity catalog and load the rotation state
/// 2. Load the work items, skipping keys already in the results file
/// 3. Build the HTTP fetcher and the profile extractor
/// 4. Run the orchestrator until the items are done or `cancel` fires
pub async fn run_sweep(config: &Config, cancel: CancellationToken) -> Result<RunSummary, SweepError> {
    let pool = Arc::new(IdentityPool::from_config(&config.egress));
    if pool.is_empty() {
        return Err(ConfigError::EmptyCatalog.into());
    }

    let sink = CsvSink::new(&config.output.results_path)
        .with_transliteration(config.output.transliterate);

    let mut items = load_items(Path::new(&config.input.path))?;
    if config.input.skip_completed {
        items = without_completed(items, &sink.completed_keys()?);
    }
    if items.is_empty() {
        tracing::info!("Nothing to do");
        return Ok(RunSummary::default());
    }

    let processor = WorkProcessor::new(
        Box::new(HttpFetcher::new(&config.target)?),
        Box::new(ProfileExtractor::new(&config.extract)?),
        BlockDetector::from_config(&config.target),
    );

    let store = RotationStateStore::new(&config.rotation.state_path, pool);
    let controller = EgressController::new(
        Box::new(CliEgress::from_config(&config.egress)),
        store,
        EgressSettings::from_config(&config.egress),
    );

    let mut orchestrator = Orchestrator::new(controller, processor, Box::new(sink))
        .with_item_delay(config.target.item_delay())
        .with_cancellation(cancel);

    orchestrator.run(&items, config.rotation.every_n).await
}
