//! # Structured Logging
//!
//! Subscriber setup and span macros built on the tracing ecosystem.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};

/// Create a tracing span for one extend pass.
#[macro_export]
macro_rules! extension_span {
    ($extension:expr, $service:expr, $kind:expr) => {
        tracing::info_span!(
            "extend",
            extension = %$extension,
            service = %$service,
            kind = %$kind,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($extension:expr, $service:expr, $kind:expr, $($field:tt)*) => {
        tracing::info_span!(
            "extend",
            extension = %$extension,
            service = %$service,
            kind = %$kind,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Install the global subscriber described by `config`.
///
/// Fails instead of panicking when a global subscriber is already set, so
/// embedding hosts and tests can call it more than once.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    config.validate()?;

    let filter = EnvFilter::try_new(&config.log_level).map_err(|e| {
        Error::config(format!("Invalid log level '{}': {}", config.log_level, e))
    })?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_logging {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    result.map_err(|e| Error::config(format!("Failed to install log subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        json_logging = config.json_logging,
        "Logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros_compile() {
        let _span = extension_span!("builtin/lua", "default/default/db", "connect-proxy");
        let _span = extension_span!(
            "builtin/lua",
            "default/default/db",
            "connect-proxy",
            direction = "upstream"
        );
    }

    #[test]
    fn test_invalid_level_rejected() {
        let config = ObservabilityConfig {
            log_level: "xds_extender=loud".to_string(),
            ..Default::default()
        };
        assert!(init_logging(&config).is_err());
    }

    #[test]
    fn test_empty_level_rejected() {
        let config = ObservabilityConfig { log_level: String::new(), ..Default::default() };
        assert!(matches!(init_logging(&config), Err(Error::Validation(_))));
    }
}
