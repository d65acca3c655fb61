//! State module for rotation progress
//!
//! This module holds the rotation state the sweep resumes from after a
//! restart, and the store that persists it.
//!
//! # Components
//!
//! - `RotationState`: current catalog index and the identities used this cycle
//! - `RotationStateStore`: crash-safe JSON persistence of that state

mod rotation_state;
mod store;

// Re-export main types
pub use rotation_state::{timestamp_now, RotationState};
pub use store::{PersistenceError, RotationStateStore, StateFile};
