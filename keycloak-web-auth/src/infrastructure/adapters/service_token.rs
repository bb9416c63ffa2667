use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::http_request::HttpRequest;
use super::provider_errors::*;
use crate::application::ports::{
    auth::ServiceTokenProvider,
    config::{AuthConfig, KeycloakConfig},
};
use crate::domain::{entities::*, errors::*};

/// When a service token is fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceTokenPolicy {
    /// A new client-credentials grant for every privileged call
    FetchPerCall,
    /// Reuse the last token until it is within `refresh_threshold` of expiry
    Cached { refresh_threshold: Duration },
}

impl From<&AuthConfig> for ServiceTokenPolicy {
    fn from(config: &AuthConfig) -> Self {
        if config.cache_service_token {
            ServiceTokenPolicy::Cached {
                refresh_threshold: config.get_refresh_threshold(),
            }
        } else {
            ServiceTokenPolicy::FetchPerCall
        }
    }
}

/// Client-credentials grant against the realm's token endpoint
pub struct ClientCredentialsTokenProvider {
    config: KeycloakConfig,
    client: reqwest::Client,
    policy: ServiceTokenPolicy,
    cached: RwLock<Option<ServiceToken>>,
}

impl ClientCredentialsTokenProvider {
    pub fn new(config: KeycloakConfig, client: reqwest::Client) -> Self {
        Self::with_policy(config, client, ServiceTokenPolicy::FetchPerCall)
    }

    pub fn with_policy(
        config: KeycloakConfig,
        client: reqwest::Client,
        policy: ServiceTokenPolicy,
    ) -> Self {
        Self {
            config,
            client,
            policy,
            cached: RwLock::new(None),
        }
    }

    pub fn policy(&self) -> ServiceTokenPolicy {
        self.policy
    }

    async fn fetch(&self) -> DomainResult<ServiceToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let token = HttpRequest::post(self.config.token_url(), "E_AUTH_SERVICE_TOKEN")
            .form(&form)
            .send::<TokenSuccessResponse, OAuthErrorResponse>(&self.client)
            .await
            .map_err(|err| {
                warn!("Service token request failed: {}", err);
                DomainError::UpstreamAuth {
                    message: describe(&err),
                }
            })?
            .body;

        Ok(ServiceToken::new(token.access_token, token.expires_in))
    }
}

#[async_trait]
impl ServiceTokenProvider for ClientCredentialsTokenProvider {
    async fn service_token(&self) -> DomainResult<ServiceToken> {
        let threshold = match self.policy {
            ServiceTokenPolicy::FetchPerCall => return self.fetch().await,
            ServiceTokenPolicy::Cached { refresh_threshold } => {
                i64::try_from(refresh_threshold.as_secs()).unwrap_or(i64::MAX)
            }
        };

        if let Some(token) = self.cached.read().await.as_ref() {
            if !token.is_expiring_soon(threshold) {
                return Ok(token.clone());
            }
        }

        let mut slot = self.cached.write().await;
        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = slot.as_ref() {
            if !token.is_expiring_soon(threshold) {
                return Ok(token.clone());
            }
        }

        debug!("Refreshing cached service token");
        let token = self.fetch().await?;
        *slot = Some(token.clone());
        Ok(token)
    }
}
