//! Configuration validation

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate a loaded configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let base = &config.templates.remote_base_url;
    if !(base.starts_with("https://") || base.starts_with("http://")) {
        return Err(ConfigError::InvalidValue {
            field: "templates.remote_base_url".to_string(),
            message: format!("must be an http(s) URL, got '{}'", base),
        }
        .into());
    }

    for (field, value) in [
        ("deploy.remote", &config.deploy.remote),
        ("deploy.beta_track", &config.deploy.beta_track),
        ("deploy.release_track", &config.deploy.release_track),
        ("deploy.flutter_version", &config.deploy.flutter_version),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                message: "must not be empty".to_string(),
            }
            .into());
        }
    }

    if config.changelog.max_length == Some(0) {
        return Err(ConfigError::InvalidValue {
            field: "changelog.max_length".to_string(),
            message: "must be greater than zero".to_string(),
        }
        .into());
    }

    Ok(())
}
