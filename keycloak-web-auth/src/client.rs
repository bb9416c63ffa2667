use std::sync::Arc;
use tracing::info;

use crate::application::{
    ports::*,
    services::{GoogleFederationService, WebAuthService},
};
use crate::domain::{
    entities::*,
    errors::{DomainError, DomainResult},
};
use crate::infrastructure::adapters::{
    ClientCredentialsTokenProvider, GoogleUserInfoAdapter, KeycloakRestAdapter,
    KeycloakTokenManager, ServiceTokenPolicy,
};

/// Keycloak client for one realm and one confidential client.
///
/// Cloning is cheap; clones share the HTTP connection pool and, when
/// enabled, the cached service token.
#[derive(Clone)]
pub struct KeycloakWebAuthClient {
    web_auth: WebAuthService,
    google: GoogleFederationService,
}

impl KeycloakWebAuthClient {
    /// Client with default settings: uncached service token, no timeouts,
    /// Google provider alias `google`
    pub fn new(
        url: impl Into<String>,
        realm: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        let keycloak = KeycloakConfig::new(url, realm, client_id, client_secret);
        Self::with_http_client(&AppConfig::new(keycloak), reqwest::Client::new())
    }

    /// Validate the configuration and build a client with its HTTP settings
    pub fn from_config(config: &AppConfig) -> DomainResult<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder().user_agent(config.http.user_agent.as_str());
        if let Some(timeout) = config.http.get_timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.http.get_connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build().map_err(|e| DomainError::Configuration {
            message: format!("Failed to build HTTP client: {e}"),
        })?;

        info!(
            "Keycloak client for realm '{}' at {}",
            config.keycloak.realm,
            config.keycloak.base_url()
        );
        Ok(Self::with_http_client(config, http))
    }

    /// Load [`AppConfig`] from the environment and build a client
    pub fn from_env() -> DomainResult<Self> {
        Self::from_config(&AppConfig::from_env()?)
    }

    /// Build on an existing `reqwest::Client`. The configuration is not
    /// validated.
    pub fn with_http_client(config: &AppConfig, http: reqwest::Client) -> Self {
        let tokens: Arc<dyn TokenManager> = Arc::new(KeycloakTokenManager::new_with_client(
            config.keycloak.clone(),
            http.clone(),
        ));
        let service_tokens: Arc<dyn ServiceTokenProvider> =
            Arc::new(ClientCredentialsTokenProvider::with_policy(
                config.keycloak.clone(),
                http.clone(),
                ServiceTokenPolicy::from(&config.auth),
            ));
        let repository: Arc<dyn UserRepository> =
            Arc::new(KeycloakRestAdapter::new(&config.keycloak, http.clone()));
        let google: Arc<dyn GoogleProfilePort> =
            Arc::new(GoogleUserInfoAdapter::new(&config.google, http));

        Self::from_parts(tokens, service_tokens, repository, google, config.google.clone())
    }

    /// Assemble a client from port implementations
    pub fn from_parts(
        tokens: Arc<dyn TokenManager>,
        service_tokens: Arc<dyn ServiceTokenProvider>,
        repository: Arc<dyn UserRepository>,
        google: Arc<dyn GoogleProfilePort>,
        google_config: GoogleConfig,
    ) -> Self {
        Self {
            web_auth: WebAuthService::new(
                tokens.clone(),
                service_tokens.clone(),
                repository.clone(),
            ),
            google: GoogleFederationService::new(
                tokens,
                service_tokens,
                repository,
                google,
                google_config,
            ),
        }
    }

    pub fn web_auth(&self) -> &WebAuthService {
        &self.web_auth
    }

    pub fn google(&self) -> &GoogleFederationService {
        &self.google
    }

    pub async fn login(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> DomainResult<TokenSuccessResponse> {
        self.web_auth.login(username_or_email, password).await
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> DomainResult<TokenSuccessResponse> {
        self.web_auth.refresh_token(refresh_token).await
    }

    pub async fn revoke_token(&self, token: &str) -> DomainResult<()> {
        self.web_auth.revoke_token(token).await
    }

    pub async fn logout(&self, refresh_token: &str) -> DomainResult<()> {
        self.web_auth.logout(refresh_token).await
    }

    pub async fn get_user_from_token(&self, access_token: &str) -> DomainResult<BasicUser> {
        self.web_auth.get_user_from_token(access_token).await
    }

    pub async fn register(&self, user: &NewUser, password: &str) -> DomainResult<EntityId> {
        self.web_auth.register(user, password).await
    }

    pub async fn delete_user(&self, user_id: &str) -> DomainResult<()> {
        self.web_auth.delete_user(user_id).await
    }

    pub async fn get_user_by_user_id(&self, user_id: &str) -> DomainResult<User> {
        self.web_auth.get_user_by_user_id(user_id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> DomainResult<User> {
        self.web_auth.get_user_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> DomainResult<User> {
        self.web_auth.get_user_by_email(email).await
    }

    pub async fn verify_email(&self, user_id: &str) -> DomainResult<()> {
        self.web_auth.verify_email(user_id).await
    }

    pub async fn set_password_user(&self, user_id: &str, password: &str) -> DomainResult<()> {
        self.web_auth.set_password_user(user_id, password).await
    }

    pub async fn user_has_password(&self, user_id: &str) -> DomainResult<bool> {
        self.web_auth.user_has_password(user_id).await
    }

    pub async fn google_auth(&self, google_token: &str) -> DomainResult<TokenSuccessResponse> {
        self.google.google_auth(google_token).await
    }

    pub async fn login_with_google(&self, google_token: &str) -> DomainResult<JwtGoogleWithUser> {
        self.google.login_with_google(google_token).await
    }

    pub async fn check_federation_google(&self, user_id: &str) -> DomainResult<bool> {
        self.google.check_federation_google(user_id).await
    }

    pub async fn federation_google(
        &self,
        user_id: &str,
        google_user_id: &str,
        google_username: &str,
    ) -> DomainResult<()> {
        self.google
            .federation_google(user_id, google_user_id, google_username)
            .await
    }

    pub async fn federated_identities(&self, user_id: &str) -> DomainResult<Vec<FederatedIdentity>> {
        self.google.federated_identities(user_id).await
    }

    pub async fn unlink_federation_google(&self, user_id: &str) -> DomainResult<()> {
        self.google.unlink_federation_google(user_id).await
    }

    pub async fn get_user_info_google(
        &self,
        google_access_token: &str,
    ) -> DomainResult<GoogleUserInfo> {
        self.google.get_user_info_google(google_access_token).await
    }
}
