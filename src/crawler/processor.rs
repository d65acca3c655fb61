//! Per-item pipeline: locate, check for a block, fetch, extract
//!
//! Processing never fails outward. Anything that goes wrong other than a
//! block degrades to an empty record for the item.

use crate::crawler::block::{BlockDetector, PageSignals};
use crate::crawler::fetcher::ContentFetcher;
use crate::crawler::parser::Extractor;
use crate::input::WorkItem;
use crate::output::ExtractionResult;

/// What processing one item produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The item is done; the record may be empty
    Completed(ExtractionResult),

    /// The target denied the current identity; the item was not consumed
    Blocked {
        /// Where the block was seen
        location: String,
    },
}

/// Runs the fetch/extract pipeline for single work items
pub struct WorkProcessor {
    fetcher: Box<dyn ContentFetcher>,
    extractor: Box<dyn Extractor>,
    detector: BlockDetector,
}

impl WorkProcessor {
    pub fn new(
        fetcher: Box<dyn ContentFetcher>,
        extractor: Box<dyn Extractor>,
        detector: BlockDetector,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            detector,
        }
    }

    /// Processes one item
    pub async fn process(&self, item: &WorkItem) -> ProcessOutcome {
        let key = item.key.as_str();

        let located = match self.fetcher.locate(key).await {
            Ok(located) => located,
            Err(e) => {
                tracing::warn!("Search for {} failed: {}", key, e);
                return ProcessOutcome::Completed(ExtractionResult::empty(key));
            }
        };

        if self
            .detector
            .is_blocked(&PageSignals::new(&located.landed_at, Some(located.status)))
        {
            tracing::warn!("Blocked while searching for {} at {}", key, located.landed_at);
            return ProcessOutcome::Blocked {
                location: located.landed_at,
            };
        }

        if let Err(e) = located.error_for_status() {
            tracing::warn!("Search for {} failed: {}", key, e);
            return ProcessOutcome::Completed(ExtractionResult::empty(key));
        }

        let Some(target) = located.target else {
            tracing::info!("No profile found for {}", key);
            return ProcessOutcome::Completed(ExtractionResult::empty(key));
        };
        tracing::debug!("Profile for {}: {}", key, target);

        let page = match self.fetcher.fetch(&target).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Fetching profile {} failed: {}", target, e);
                return ProcessOutcome::Completed(ExtractionResult::empty(key));
            }
        };

        if self
            .detector
            .is_blocked(&PageSignals::new(&page.final_url, Some(page.status)))
        {
            tracing::warn!("Blocked while fetching {} at {}", key, page.final_url);
            return ProcessOutcome::Blocked {
                location: page.final_url,
            };
        }

        if let Err(e) = page.error_for_status() {
            tracing::warn!("Fetching profile {} failed: {}", page.final_url, e);
            return ProcessOutcome::Completed(ExtractionResult::empty(key));
        }

        match self.extractor.extract(&page.body) {
            Ok(fields) => ProcessOutcome::Completed(ExtractionResult::new(key, fields)),
            Err(e) => {
                tracing::warn!("Extraction for {} failed: {}", key, e);
                ProcessOutcome::Completed(ExtractionResult::empty(key))
            }
        }
    }
}
