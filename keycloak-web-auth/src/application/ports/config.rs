use crate::domain::errors::{ConfigError, DomainResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration port for accessing client configuration
pub trait ConfigurationPort: Send + Sync {
    fn get_keycloak_config(&self) -> &KeycloakConfig;

    fn get_google_config(&self) -> &GoogleConfig;

    fn get_auth_config(&self) -> &AuthConfig;

    fn get_http_config(&self) -> &HttpConfig;

    fn get_logging_config(&self) -> &LoggingConfig;

    /// Validate all configuration
    fn validate(&self) -> DomainResult<()>;
}

/// Keycloak server and confidential client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeycloakConfig {
    pub url: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: String,
}

impl KeycloakConfig {
    pub fn new(
        url: impl Into<String>,
        realm: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            realm: realm.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.url.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "KEYCLOAK_URL".to_string(),
            }
            .into());
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "KEYCLOAK_URL".to_string(),
                message: "Must start with http:// or https://".to_string(),
            }
            .into());
        }

        if self.realm.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "KEYCLOAK_REALM".to_string(),
            }
            .into());
        }

        if self.client_id.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "KEYCLOAK_CLIENT_ID".to_string(),
            }
            .into());
        }

        if self.client_secret.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "KEYCLOAK_CLIENT_SECRET".to_string(),
            }
            .into());
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// `{url}/realms/{realm}/protocol/openid-connect/{endpoint}`
    pub fn openid_url(&self, endpoint: &str) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/{}",
            self.base_url(),
            self.realm,
            endpoint
        )
    }

    pub fn token_url(&self) -> String {
        self.openid_url("token")
    }
}

pub const DEFAULT_GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Google federation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub userinfo_url: String,
    /// Alias of the Google identity provider inside the realm
    pub identity_provider: String,
    /// `subject_issuer` sent on token exchange
    pub subject_issuer: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            userinfo_url: DEFAULT_GOOGLE_USERINFO_URL.to_string(),
            identity_provider: "google".to_string(),
            subject_issuer: "google".to_string(),
        }
    }
}

impl GoogleConfig {
    pub fn validate(&self) -> DomainResult<()> {
        if self.identity_provider.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "GOOGLE_IDENTITY_PROVIDER".to_string(),
                message: "Must not be empty".to_string(),
            }
            .into());
        }

        if self.subject_issuer.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "GOOGLE_SUBJECT_ISSUER".to_string(),
                message: "Must not be empty".to_string(),
            }
            .into());
        }

        if !self.userinfo_url.starts_with("http://") && !self.userinfo_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                key: "GOOGLE_USERINFO_URL".to_string(),
                message: "Must start with http:// or https://".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Upper bound for `token_refresh_threshold_seconds`
pub const MAX_TOKEN_REFRESH_THRESHOLD_SECONDS: u64 = 86_400;

/// Service token handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Reuse the service token until it nears expiry instead of fetching one
    /// per privileged call
    pub cache_service_token: bool,
    pub token_refresh_threshold_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cache_service_token: false,
            token_refresh_threshold_seconds: 30,
        }
    }
}

impl AuthConfig {
    pub fn validate(&self) -> DomainResult<()> {
        if self.cache_service_token && self.token_refresh_threshold_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "AUTH_TOKEN_REFRESH_THRESHOLD_SECONDS".to_string(),
                message: "Must be greater than 0 when caching is enabled".to_string(),
            }
            .into());
        }

        if self.token_refresh_threshold_seconds > MAX_TOKEN_REFRESH_THRESHOLD_SECONDS {
            return Err(ConfigError::InvalidValue {
                key: "AUTH_TOKEN_REFRESH_THRESHOLD_SECONDS".to_string(),
                message: format!("Must not exceed {MAX_TOKEN_REFRESH_THRESHOLD_SECONDS}"),
            }
            .into());
        }

        Ok(())
    }

    pub fn get_refresh_threshold(&self) -> Duration {
        Duration::from_secs(self.token_refresh_threshold_seconds)
    }
}

/// HTTP client configuration. Timeouts are unset unless configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: Option<u64>,
    pub connect_timeout_seconds: Option<u64>,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            connect_timeout_seconds: None,
            user_agent: concat!("keycloak-web-auth/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn validate(&self) -> DomainResult<()> {
        if self.timeout_seconds == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "HTTP_TIMEOUT_SECONDS".to_string(),
                message: "Must be greater than 0".to_string(),
            }
            .into());
        }

        if self.connect_timeout_seconds == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "HTTP_CONNECT_TIMEOUT_SECONDS".to_string(),
                message: "Must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    pub fn get_connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_seconds.map(Duration::from_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
        }
    }
}

/// Log level enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log format enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Complete client configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub keycloak: KeycloakConfig,
    pub google: GoogleConfig,
    pub auth: AuthConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Configuration with defaults for everything but the Keycloak client
    pub fn new(keycloak: KeycloakConfig) -> Self {
        Self {
            keycloak,
            google: GoogleConfig::default(),
            auth: AuthConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        self.keycloak.validate()?;
        self.google.validate()?;
        self.auth.validate()?;
        self.http.validate()?;
        Ok(())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup, using the same keys as
    /// [`AppConfig::from_env`]
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| ConfigError::MissingRequired {
                key: key.to_string(),
            })
        };

        let keycloak = KeycloakConfig {
            url: required("KEYCLOAK_URL")?,
            realm: required("KEYCLOAK_REALM")?,
            client_id: required("KEYCLOAK_CLIENT_ID")?,
            client_secret: required("KEYCLOAK_CLIENT_SECRET")?,
        };

        let defaults = GoogleConfig::default();
        let google = GoogleConfig {
            userinfo_url: lookup("GOOGLE_USERINFO_URL").unwrap_or(defaults.userinfo_url),
            identity_provider: lookup("GOOGLE_IDENTITY_PROVIDER")
                .unwrap_or(defaults.identity_provider),
            subject_issuer: lookup("GOOGLE_SUBJECT_ISSUER").unwrap_or(defaults.subject_issuer),
        };

        let auth = AuthConfig {
            cache_service_token: parse_or(&lookup, "AUTH_CACHE_SERVICE_TOKEN", false)?,
            token_refresh_threshold_seconds: parse_or(
                &lookup,
                "AUTH_TOKEN_REFRESH_THRESHOLD_SECONDS",
                AuthConfig::default().token_refresh_threshold_seconds,
            )?,
        };

        let http = HttpConfig {
            timeout_seconds: parse_opt(&lookup, "HTTP_TIMEOUT_SECONDS")?,
            connect_timeout_seconds: parse_opt(&lookup, "HTTP_CONNECT_TIMEOUT_SECONDS")?,
            user_agent: lookup("HTTP_USER_AGENT").unwrap_or(HttpConfig::default().user_agent),
        };

        let logging = LoggingConfig {
            level: parse_or(&lookup, "LOG_LEVEL", LogLevel::Info)?,
            format: parse_or(&lookup, "LOG_FORMAT", LogFormat::Compact)?,
        };

        let config = AppConfig {
            keycloak,
            google,
            auth,
            http,
            logging,
        };

        config.validate()?;
        Ok(config)
    }
}

fn parse_opt<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {s}")),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {s}")),
        }
    }
}
