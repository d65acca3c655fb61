//! VPN-Sweep: a resilient, identity-rotating record harvester
//!
//! This crate works through a list of identifier keys against a rate-limited
//! target site, rotating the VPN egress identity it presents so that a block
//! on one identity never stalls the whole run. Rotation progress survives
//! restarts, and every processed key produces exactly one output row.

pub mod config;
pub mod crawler;
pub mod egress;
pub mod identity;
pub mod input;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for VPN-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The very first egress identity could not be established; no work is possible
    #[error("Initial egress connection failed: {0}")]
    Initialization(#[source] egress::EgressError),

    #[error("Egress error: {0}")]
    Egress(#[from] egress::EgressError),

    #[error("Identity error: {0}")]
    Identity(#[from] identity::IdentityError),

    #[error("State persistence error: {0}")]
    Persistence(#[from] state::PersistenceError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] crawler::ExtractionError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SweepError {
    /// Process exit code the binary reports for this error
    ///
    /// Configuration problems and a failed initial connection get their own
    /// codes so wrappers can tell them apart from a run that did work.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Initialization(_) => 3,
            _ => 1,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Identity catalog is empty")]
    EmptyCatalog,

    #[error("Failed to read input file {path}: {source}")]
    Input {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for VPN-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Orchestrator, RunSummary, WorkProcessor};
pub use egress::{EgressController, EgressState};
pub use identity::{Identity, IdentityPool};
pub use output::{ExtractionResult, Field, Fields};
pub use state::{RotationState, RotationStateStore};
