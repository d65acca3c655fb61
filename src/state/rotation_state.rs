//! Rotation progress that survives restarts
//!
//! The controller is the only writer; it mutates a copy and swaps it in once
//! the new identity is established.

use chrono::Local;

/// Timestamp format used in the state file
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Returns the current local time in the state file's format
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Persisted rotation progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationState {
    /// Catalog index of the current identity
    pub current_index: usize,

    /// Identities used in the current cycle, in the order they were used
    pub used: Vec<String>,

    /// When the state last changed
    pub last_updated: String,
}

impl RotationState {
    /// Fresh state: start of the catalog, nothing used
    pub fn new() -> Self {
        Self {
            current_index: 0,
            used: Vec::new(),
            last_updated: timestamp_now(),
        }
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.iter().any(|u| u == name)
    }

    /// Records `name` as used; a name already present is not added twice
    pub fn mark_used(&mut self, name: &str) {
        if !self.is_used(name) {
            self.used.push(name.to_string());
        }
    }

    /// Starts a new cycle by forgetting every used identity
    pub fn reset_cycle(&mut self) {
        self.used.clear();
    }

    /// Refreshes the last-updated timestamp
    pub fn touch(&mut self) {
        self.last_updated = timestamp_now();
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::new()
    }
}
