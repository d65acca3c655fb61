//! Config file loading
//!
//! A config is parsed, then any command-line overrides are layered on top,
//! and the merged result is validated once. The hash logged at start-up is
//! taken over the file as read, before overrides.

use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Settings given on the command line that replace values from the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Replaces `[input] path`
    pub input: Option<PathBuf>,
    /// Replaces `[output] results-path`
    pub output: Option<PathBuf>,
    /// Replaces `[rotation] every-n`
    pub rotate_every: Option<usize>,
}

impl ConfigOverrides {
    /// Writes every set override into `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.input.path = input.display().to_string();
        }
        if let Some(output) = &self.output {
            config.output.results_path = output.display().to_string();
        }
        if let Some(every_n) = self.rotate_every {
            config.rotation.every_n = every_n;
        }
    }
}

/// Loads and validates a configuration file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use vpn_sweep::config::load_config;
///
/// let config = load_config(Path::new("sweep.toml")).unwrap();
/// println!("Rotating every {} items", config.rotation.every_n);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_overrides(path, &ConfigOverrides::default()).map(|(config, _)| config)
}

/// Loads a configuration, applies `overrides` and validates the result
///
/// Returns the config together with the SHA-256 of the file content, so two
/// runs can be matched to the exact settings file they used.
pub fn load_config_with_overrides(
    path: &Path,
    overrides: &ConfigOverrides,
) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;
    overrides.apply(&mut config);
    validate(&config)?;
    Ok((config, content_hash(&content)))
}

/// Hex SHA-256 of a config file's content
fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
