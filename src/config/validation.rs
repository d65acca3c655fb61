use crate::config::types::{
    Config, EgressConfig, InputConfig, OutputConfig, RotationConfig, TargetConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_egress_config(&config.egress)?;
    validate_rotation_config(&config.rotation)?;
    validate_input_config(&config.input)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates target site configuration
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.search_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "search-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.search_param.is_empty() {
        return Err(ConfigError::Validation(
            "search-param cannot be empty".to_string(),
        ));
    }

    if scraper::Selector::parse(&config.profile_link_selector).is_err() {
        return Err(ConfigError::Validation(format!(
            "profile-link-selector is not a valid CSS selector: '{}'",
            config.profile_link_selector
        )));
    }

    if config.blocked_patterns.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::Validation(
            "blocked-patterns cannot contain empty patterns".to_string(),
        ));
    }

    if config.request_timeout < 1 || config.request_timeout > 600 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be between 1 and 600 seconds, got {}",
            config.request_timeout
        )));
    }

    Ok(())
}

/// Validates egress control configuration
fn validate_egress_config(config: &EgressConfig) -> Result<(), ConfigError> {
    if config.command.is_empty() {
        return Err(ConfigError::Validation(
            "egress command cannot be empty".to_string(),
        ));
    }

    if !config.connect_args.iter().any(|a| a.contains("{identity}")) {
        return Err(ConfigError::Validation(
            "connect-args must contain the {identity} placeholder".to_string(),
        ));
    }

    if config.max_attempts < 1 || config.max_attempts > 20 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 20, got {}",
            config.max_attempts
        )));
    }

    if config.connect_timeout < 1 || config.disconnect_timeout < 1 {
        return Err(ConfigError::Validation(
            "connect-timeout and disconnect-timeout must be at least 1 second".to_string(),
        ));
    }

    if config.connect_marker.trim().is_empty() || config.disconnect_marker.trim().is_empty() {
        return Err(ConfigError::Validation(
            "connect-marker and disconnect-marker cannot be empty".to_string(),
        ));
    }

    if let Some(identities) = &config.identities {
        if identities.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        for (i, name) in identities.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "identity #{} has an empty name",
                    i
                )));
            }

            if identities[..i].contains(name) {
                return Err(ConfigError::Validation(format!(
                    "identity '{}' is listed more than once",
                    name
                )));
            }
        }
    }

    Ok(())
}

/// Validates rotation configuration
fn validate_rotation_config(config: &RotationConfig) -> Result<(), ConfigError> {
    if config.every_n < 1 {
        return Err(ConfigError::Validation(format!(
            "rotation every-n must be >= 1, got {}",
            config.every_n
        )));
    }

    if config.state_path.is_empty() {
        return Err(ConfigError::Validation(
            "state-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "input path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.results_path.is_empty() {
        return Err(ConfigError::Validation(
            "results-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
