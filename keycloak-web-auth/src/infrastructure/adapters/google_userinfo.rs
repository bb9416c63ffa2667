use async_trait::async_trait;
use reqwest::StatusCode;

use super::http_request::HttpRequest;
use super::provider_errors::*;
use crate::application::ports::{config::GoogleConfig, repository::GoogleProfilePort};
use crate::domain::{entities::GoogleUserInfo, errors::*};

/// Reads a Google profile with the user's Google access token
pub struct GoogleUserInfoAdapter {
    userinfo_url: String,
    client: reqwest::Client,
}

impl GoogleUserInfoAdapter {
    pub fn new(config: &GoogleConfig, client: reqwest::Client) -> Self {
        Self {
            userinfo_url: config.userinfo_url.clone(),
            client,
        }
    }
}

#[async_trait]
impl GoogleProfilePort for GoogleUserInfoAdapter {
    async fn get_user_info(&self, google_access_token: &str) -> DomainResult<GoogleUserInfo> {
        let response = HttpRequest::get(&self.userinfo_url, "E_AUTH_GET_USER_INFO_GOOGLE")
            .bearer(google_access_token)
            .send::<GoogleUserInfo, GoogleErrorResponse>(&self.client)
            .await
            .map_err(|err| match err.status() {
                Some(StatusCode::UNAUTHORIZED) => DomainError::InvalidToken {
                    reason: describe(&err),
                },
                _ => upstream_error(err),
            })?;

        Ok(response.body)
    }
}
