use reqwest::StatusCode;
use serde::Deserialize;

use super::http_request::RequestError;
use crate::domain::errors::DomainError;

/// Error payload shapes understood by [`describe`]
pub trait ProviderErrorPayload {
    /// Human-readable description, if the payload carries one
    fn description(&self) -> Option<&str>;
}

/// `{error, error_description}` as returned by OAuth2 endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthErrorResponse {
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl ProviderErrorPayload for OAuthErrorResponse {
    fn description(&self) -> Option<&str> {
        self.error_description
            .as_deref()
            .or(self.error.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Google API error envelope: `{error: {code, message, status}}`
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorResponse {
    pub error: GoogleErrorObject,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoogleErrorObject {
    pub code: i64,
    pub message: String,
    pub status: String,
}

impl ProviderErrorPayload for GoogleErrorResponse {
    fn description(&self) -> Option<&str> {
        Some(self.error.message.as_str()).filter(|s| !s.is_empty())
    }
}

/// Provider description when the error body matched, else the raw text
pub fn describe<E: ProviderErrorPayload>(err: &RequestError<E>) -> String {
    err.body()
        .and_then(|body| body.description())
        .unwrap_or_else(|| err.raw_message())
        .to_string()
}

/// Keycloak's wording when a token exchange or create would duplicate an account
const USER_ALREADY_EXISTS: &str = "User already exists";

/// Classify a duplicate-account rejection. 409 is authoritative; the
/// description match covers the token-exchange endpoint, which reports the
/// condition with a 4xx carrying only the message.
pub fn is_user_already_exists(status: StatusCode, description: &str) -> bool {
    status == StatusCode::CONFLICT || description.trim().eq_ignore_ascii_case(USER_ALREADY_EXISTS)
}

/// Default mapping for failures that have no operation-specific meaning
pub fn upstream_error<E: ProviderErrorPayload>(err: RequestError<E>) -> DomainError {
    match err.status() {
        Some(status) => DomainError::Upstream {
            status: status.as_u16(),
            message: describe(&err),
        },
        None => DomainError::UpstreamTransport {
            message: err.to_string(),
        },
    }
}
