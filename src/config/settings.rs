//! # Configuration Settings
//!
//! Process-level settings for hosts embedding the extender.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{Error, Result};

pub const SERVICE_NAME_ENV: &str = "XDS_EXTENDER_SERVICE_NAME";
pub const LOG_LEVEL_ENV: &str = "XDS_EXTENDER_LOG_LEVEL";
pub const LOG_JSON_ENV: &str = "XDS_EXTENDER_LOG_JSON";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Service name attached to log output
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive such as `xds_extender=debug`)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: crate::APP_NAME.to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let service_name = std::env::var(SERVICE_NAME_ENV).unwrap_or(defaults.service_name);
        let log_level = std::env::var(LOG_LEVEL_ENV).unwrap_or(defaults.log_level);
        let json_logging = match std::env::var(LOG_JSON_ENV) {
            Ok(raw) => parse_bool(&raw).ok_or_else(|| {
                Error::config(format!("Invalid {}: '{}' is not a boolean", LOG_JSON_ENV, raw))
            })?,
            Err(_) => defaults.json_logging,
        };

        let config = Self { service_name, log_level, json_logging };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
