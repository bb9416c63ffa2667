use thiserror::Error;

/// Errors surfaced by the Keycloak web auth client
#[derive(Error, Debug)]
pub enum DomainError {
    /// The provider rejected a client grant (service token, token exchange)
    #[error("Upstream authentication failed: {message}")]
    UpstreamAuth { message: String },

    /// The provider rejected the end-user credentials. The message is the
    /// provider's own description, unprefixed.
    #[error("{message}")]
    InvalidCredentials { message: String },

    #[error("Invalid token: {reason}")]
    InvalidToken { reason: String },

    #[error("{resource} not found: {identifier}")]
    NotFound {
        resource: String,
        identifier: String,
    },

    #[error("User already exists: {message}")]
    UserAlreadyExists { message: String },

    #[error("Upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Upstream transport error: {message}")]
    UpstreamTransport { message: String },

    /// Registration created the user but could not finish. When
    /// `rolled_back` is false the orphaned user still exists upstream.
    #[error("Registration of user {user_id} failed after creation (rolled back: {rolled_back}): {reason}")]
    PartialFailure {
        user_id: String,
        rolled_back: bool,
        reason: String,
    },

    #[error("Google login failed during {step}: {source}")]
    FederatedLogin {
        step: String,
        #[source]
        source: Box<DomainError>,
    },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn not_found(resource: &str, identifier: &str) -> Self {
        DomainError::NotFound {
            resource: resource.to_string(),
            identifier: identifier.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound { .. })
    }

    pub fn is_user_already_exists(&self) -> bool {
        matches!(self, DomainError::UserAlreadyExists { .. })
    }

    /// HTTP status a caller would typically answer with for this error
    pub fn status_hint(&self) -> u16 {
        match self {
            DomainError::InvalidCredentials { .. } | DomainError::InvalidToken { .. } => 401,
            DomainError::UpstreamAuth { .. } => 502,
            DomainError::NotFound { .. } => 404,
            DomainError::UserAlreadyExists { .. } => 409,
            DomainError::Validation { .. } => 400,
            DomainError::Upstream { .. }
            | DomainError::UpstreamTransport { .. }
            | DomainError::PartialFailure { .. } => 502,
            DomainError::FederatedLogin { source, .. } => source.status_hint(),
            DomainError::Configuration { .. } => 500,
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}")]
    MissingRequired { key: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl From<ConfigError> for DomainError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingRequired { key } => DomainError::Configuration {
                message: format!("Missing required configuration: {key}"),
            },
            ConfigError::InvalidValue { key, message } => DomainError::Configuration {
                message: format!("Invalid value for {key}: {message}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_displays_provider_message_verbatim() {
        let err = DomainError::InvalidCredentials {
            message: "Invalid user credentials".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid user credentials");
    }

    #[test]
    fn federated_login_inherits_status_of_cause() {
        let err = DomainError::FederatedLogin {
            step: "userinfo".to_string(),
            source: Box::new(DomainError::InvalidToken {
                reason: "expired".to_string(),
            }),
        };
        assert_eq!(err.status_hint(), 401);
        assert!(err.to_string().contains("userinfo"));
    }

    #[test]
    fn config_error_becomes_configuration() {
        let err: DomainError = ConfigError::MissingRequired {
            key: "KEYCLOAK_URL".to_string(),
        }
        .into();
        assert!(matches!(err, DomainError::Configuration { .. }));
        assert!(err.to_string().contains("KEYCLOAK_URL"));
    }
}
