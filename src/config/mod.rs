//! Configuration module for VPN-Sweep
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use vpn_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sweep.toml")).unwrap();
//! println!("State file: {}", config.rotation.state_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, EgressConfig, ExtractConfig, InputConfig, OutputConfig, RotationConfig, TargetConfig,
};

// Re-export parser functions
pub use parser::{load_config, load_config_with_overrides, ConfigOverrides};
