use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::http_request::{HttpRequest, RequestError};
use super::provider_errors::*;
use crate::application::ports::{auth::TokenManager, config::KeycloakConfig};
use crate::domain::{entities::*, errors::*};

const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const REFRESH_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:refresh_token";

/// Claims returned by the OpenID Connect userinfo endpoint
#[derive(Debug, Clone, Deserialize)]
struct RawUserInfo {
    sub: String,
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Keycloak token manager implementation
pub struct KeycloakTokenManager {
    config: KeycloakConfig,
    client: reqwest::Client,
}

impl KeycloakTokenManager {
    pub fn new(config: KeycloakConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn new_with_client(config: KeycloakConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn client_form<'a>(&'a self, extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        let mut form = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        form.extend_from_slice(extra);
        form
    }

    async fn token_request(
        &self,
        form: &[(&str, &str)],
        operation: &'static str,
    ) -> Result<TokenSuccessResponse, RequestError<OAuthErrorResponse>> {
        HttpRequest::post(self.config.token_url(), operation)
            .form(form)
            .send::<TokenSuccessResponse, OAuthErrorResponse>(&self.client)
            .await
            .map(|response| response.body)
    }
}

/// 400 and 401 are how the token endpoints reject a grant; anything else is an
/// upstream failure
fn is_rejection(status: StatusCode) -> bool {
    status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED
}

fn invalid_token_or_upstream(err: RequestError<OAuthErrorResponse>) -> DomainError {
    match err.status() {
        Some(status) if is_rejection(status) || status == StatusCode::FORBIDDEN => {
            DomainError::InvalidToken {
                reason: describe(&err),
            }
        }
        _ => upstream_error(err),
    }
}

#[async_trait]
impl TokenManager for KeycloakTokenManager {
    async fn password_grant(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> DomainResult<TokenSuccessResponse> {
        let form = self.client_form(&[
            ("grant_type", "password"),
            ("username", username_or_email),
            ("password", password),
            ("scope", "openid"),
        ]);

        self.token_request(&form, "E_AUTH_LOGIN")
            .await
            .map_err(|err| match err.status() {
                Some(status) if is_rejection(status) => DomainError::InvalidCredentials {
                    message: describe(&err),
                },
                _ => upstream_error(err),
            })
    }

    async fn refresh_grant(&self, refresh_token: &str) -> DomainResult<TokenSuccessResponse> {
        let form = self.client_form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ]);

        self.token_request(&form, "E_AUTH_REFRESH_TOKEN")
            .await
            .map_err(invalid_token_or_upstream)
    }

    async fn revoke(&self, token: &str) -> DomainResult<()> {
        let form = self.client_form(&[("token", token)]);

        HttpRequest::post(self.config.openid_url("revoke"), "E_AUTH_REVOKE_TOKEN")
            .form(&form)
            .send_empty::<OAuthErrorResponse>(&self.client)
            .await
            .map_err(invalid_token_or_upstream)?;

        Ok(())
    }

    async fn logout(&self, refresh_token: &str) -> DomainResult<()> {
        let form = self.client_form(&[("refresh_token", refresh_token)]);

        HttpRequest::post(self.config.openid_url("logout"), "E_AUTH_LOGOUT")
            .form(&form)
            .send_empty::<OAuthErrorResponse>(&self.client)
            .await
            .map_err(invalid_token_or_upstream)?;

        Ok(())
    }

    async fn exchange_token(
        &self,
        subject_token: &str,
        subject_issuer: &str,
    ) -> DomainResult<TokenSuccessResponse> {
        let form = self.client_form(&[
            ("grant_type", TOKEN_EXCHANGE_GRANT),
            ("requested_token_type", REFRESH_TOKEN_TYPE),
            ("subject_token", subject_token),
            ("subject_issuer", subject_issuer),
            ("scope", "openid"),
        ]);

        self.token_request(&form, "E_AUTH_GOOGLE")
            .await
            .map_err(|err| match err.status() {
                Some(status) if is_user_already_exists(status, &describe(&err)) => {
                    DomainError::UserAlreadyExists {
                        message: describe(&err),
                    }
                }
                Some(status) if status.is_client_error() => DomainError::UpstreamAuth {
                    message: describe(&err),
                },
                _ => upstream_error(err),
            })
    }

    async fn user_info(&self, access_token: &str) -> DomainResult<BasicUser> {
        let info = HttpRequest::get(self.config.openid_url("userinfo"), "E_AUTH_USER_INFO")
            .bearer(access_token)
            .send::<RawUserInfo, OAuthErrorResponse>(&self.client)
            .await
            .map_err(invalid_token_or_upstream)?
            .body;

        Ok(BasicUser {
            id: info.sub,
            username: info.preferred_username.unwrap_or_default(),
            email: info.email.unwrap_or_default(),
        })
    }
}
