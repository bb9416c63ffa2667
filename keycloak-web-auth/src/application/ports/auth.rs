use crate::domain::{
    entities::{BasicUser, ServiceToken, TokenSuccessResponse},
    errors::DomainResult,
};
use async_trait::async_trait;

/// End-user token operations against the provider's OpenID Connect endpoints
#[async_trait]
pub trait TokenManager: Send + Sync {
    /// Resource-owner password grant
    async fn password_grant(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> DomainResult<TokenSuccessResponse>;

    async fn refresh_grant(&self, refresh_token: &str) -> DomainResult<TokenSuccessResponse>;

    /// Revoke an access or refresh token
    async fn revoke(&self, token: &str) -> DomainResult<()>;

    /// End the session bound to a refresh token
    async fn logout(&self, refresh_token: &str) -> DomainResult<()>;

    /// Exchange a token issued by `subject_issuer` for a provider token set
    async fn exchange_token(
        &self,
        subject_token: &str,
        subject_issuer: &str,
    ) -> DomainResult<TokenSuccessResponse>;

    /// Resolve an access token to the user it was issued to
    async fn user_info(&self, access_token: &str) -> DomainResult<BasicUser>;
}

/// Source of client-credentials tokens for administrative calls
#[async_trait]
pub trait ServiceTokenProvider: Send + Sync {
    async fn service_token(&self) -> DomainResult<ServiceToken>;
}
