//! Subscriber setup for binaries embedding the client.
//!
//! `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::application::ports::config::{LogFormat, LoggingConfig};
use crate::domain::errors::{DomainError, DomainResult};

/// Default directive when `RUST_LOG` is unset
pub fn default_directive(config: &LoggingConfig) -> String {
    format!("keycloak_web_auth={}", config.level)
}

/// Install a global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &LoggingConfig) -> DomainResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true))
            .try_init(),
    };

    result.map_err(|e| DomainError::Configuration {
        message: format!("Failed to initialize tracing: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::config::LogLevel;

    #[test]
    fn directive_targets_this_crate() {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            format: LogFormat::Json,
        };
        assert_eq!(default_directive(&config), "keycloak_web_auth=debug");
    }
}
