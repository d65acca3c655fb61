//! Egress module for switching the VPN identity
//!
//! This module contains everything that touches the outside network path:
//! - Running the external VPN control program with timeouts
//! - The `EgressCommand` capability the controller drives
//! - The `EgressController` state machine that establishes, rotates and
//!   releases identities and owns the rotation state

mod command;
mod controller;
mod process;

pub use command::{CliEgress, EgressCommand};
pub use controller::{EgressController, EgressSettings};
pub use process::{ProcessOutput, ProcessRunner};

use crate::identity::{Identity, IdentityError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while controlling the egress path
#[derive(Debug, Error)]
pub enum EgressError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Every connect attempt for an identity failed
    #[error("Failed to connect to {identity} after {attempts} attempts: {last_error}")]
    Exhausted {
        identity: String,
        attempts: u32,
        last_error: String,
    },

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Connection status of the egress controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EgressState {
    Disconnected,
    Connecting,
    Connected,
    /// The last establish exhausted its attempts
    Failed,
}

impl fmt::Display for EgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Why a rotation happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationCause {
    Initial,
    Scheduled,
    Blocked,
}

impl fmt::Display for RotationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initial => "initial",
            Self::Scheduled => "scheduled",
            Self::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

/// A completed identity switch, for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationEvent {
    pub cause: RotationCause,
    pub previous: Option<Identity>,
    pub current: Identity,
    pub index: usize,
}

impl fmt::Display for RotationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.previous {
            Some(prev) => write!(
                f,
                "{} rotation: {} -> {} (#{})",
                self.cause, prev, self.current, self.index
            ),
            None => write!(f, "{} rotation: {} (#{})", self.cause, self.current, self.index),
        }
    }
}
