use crate::application::ports::{
    AppConfig, AuthConfig, ConfigurationPort, GoogleConfig, HttpConfig, KeycloakConfig,
    LoggingConfig,
};
use crate::domain::errors::DomainResult;

/// Environment-based configuration adapter
#[derive(Debug, Clone)]
pub struct EnvConfigurationAdapter {
    config: AppConfig,
}

impl EnvConfigurationAdapter {
    pub fn new() -> DomainResult<Self> {
        let config = AppConfig::from_env()?;
        Ok(Self { config })
    }

    /// Wrap an already loaded configuration
    pub fn from_config(config: AppConfig) -> DomainResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn into_inner(self) -> AppConfig {
        self.config
    }
}

impl ConfigurationPort for EnvConfigurationAdapter {
    fn get_keycloak_config(&self) -> &KeycloakConfig {
        &self.config.keycloak
    }

    fn get_google_config(&self) -> &GoogleConfig {
        &self.config.google
    }

    fn get_auth_config(&self) -> &AuthConfig {
        &self.config.auth
    }

    fn get_http_config(&self) -> &HttpConfig {
        &self.config.http
    }

    fn get_logging_config(&self) -> &LoggingConfig {
        &self.config.logging
    }

    fn validate(&self) -> DomainResult<()> {
        self.config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_valid_config() {
        let config = AppConfig::new(KeycloakConfig::new(
            "http://localhost:8080",
            "shop",
            "web",
            "secret",
        ));
        let adapter = EnvConfigurationAdapter::from_config(config).unwrap();
        assert_eq!(adapter.get_keycloak_config().realm, "shop");
        assert_eq!(adapter.get_google_config().identity_provider, "google");
        assert!(!adapter.get_auth_config().cache_service_token);
        assert!(adapter.get_http_config().get_timeout().is_none());
        assert!(ConfigurationPort::validate(&adapter).is_ok());
    }

    #[test]
    fn rejects_invalid_config() {
        let config = AppConfig::new(KeycloakConfig::new("localhost", "shop", "web", "secret"));
        assert!(EnvConfigurationAdapter::from_config(config).is_err());
    }
}
