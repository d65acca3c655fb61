//! Work-item input
//!
//! Keys are read once at start-up from a text file, one per line.

use crate::ConfigError;
use std::collections::HashSet;
use std::path::Path;

/// One unit of work, identified by an opaque key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    pub key: String,
}

impl WorkItem {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Parses work items from text: lines are trimmed, blank lines skipped
pub fn parse_items(content: &str) -> Vec<WorkItem> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(WorkItem::new)
        .collect()
}

/// Loads work items from a file
pub fn load_items(path: &Path) -> Result<Vec<WorkItem>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Input {
        path: path.display().to_string(),
        source,
    })?;
    let items = parse_items(&content);
    tracing::info!("Loaded {} work items from {}", items.len(), path.display());
    Ok(items)
}

/// Drops items whose key is in `completed`, keeping order
pub fn without_completed(items: Vec<WorkItem>, completed: &HashSet<String>) -> Vec<WorkItem> {
    if completed.is_empty() {
        return items;
    }

    let total = items.len();
    let remaining: Vec<WorkItem> = items
        .into_iter()
        .filter(|item| !completed.contains(&item.key))
        .collect();
    tracing::info!(
        "Skipping {} already completed items, {} remaining",
        total - remaining.len(),
        remaining.len()
    );
    remaining
}
