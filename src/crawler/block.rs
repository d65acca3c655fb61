//! Block detection
//!
//! Decides from response signals whether the target has denied the current
//! egress identity. The check is a heuristic: a site that blocks without
//! redirecting or changing status is not recognised.

use crate::config::TargetConfig;

/// Response signals a block decision is made from
#[derive(Debug, Clone, Copy)]
pub struct PageSignals<'a> {
    /// Location after redirects
    pub location: &'a str,
    /// HTTP status, when known
    pub status: Option<u16>,
}

impl<'a> PageSignals<'a> {
    pub fn new(location: &'a str, status: Option<u16>) -> Self {
        Self { location, status }
    }
}

/// Classifies responses as blocked or not
#[derive(Debug, Clone)]
pub struct BlockDetector {
    patterns: Vec<String>,
    statuses: Vec<u16>,
}

impl BlockDetector {
    pub fn new(patterns: Vec<String>, statuses: Vec<u16>) -> Self {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            statuses,
        }
    }

    pub fn from_config(config: &TargetConfig) -> Self {
        Self::new(
            config.blocked_patterns.clone(),
            config.blocked_statuses.clone(),
        )
    }

    /// True if the location contains an access-denied pattern or the status
    /// is one of the blocked statuses
    pub fn is_blocked(&self, signals: &PageSignals<'_>) -> bool {
        let location = signals.location.to_lowercase();
        if self.patterns.iter().any(|p| location.contains(p.as_str())) {
            return true;
        }

        signals
            .status
            .is_some_and(|status| self.statuses.contains(&status))
    }
}
