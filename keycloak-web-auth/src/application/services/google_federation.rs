use crate::{
    application::ports::*,
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Steps of [`GoogleFederationService::login_with_google`], as reported in
/// [`DomainError::FederatedLogin`]
pub mod steps {
    pub const TOKEN_EXCHANGE: &str = "token_exchange";
    pub const USER_INFO: &str = "user_info";
}

/// Sign-in with Google through Keycloak token exchange, and management of
/// the Google link on existing accounts
#[derive(Clone)]
pub struct GoogleFederationService {
    tokens: Arc<dyn TokenManager>,
    service_tokens: Arc<dyn ServiceTokenProvider>,
    repository: Arc<dyn UserRepository>,
    google: Arc<dyn GoogleProfilePort>,
    config: GoogleConfig,
}

impl GoogleFederationService {
    pub fn new(
        tokens: Arc<dyn TokenManager>,
        service_tokens: Arc<dyn ServiceTokenProvider>,
        repository: Arc<dyn UserRepository>,
        google: Arc<dyn GoogleProfilePort>,
        config: GoogleConfig,
    ) -> Self {
        Self {
            tokens,
            service_tokens,
            repository,
            google,
            config,
        }
    }

    pub fn identity_provider(&self) -> &str {
        &self.config.identity_provider
    }

    /// Exchange a Google token for a Keycloak token set
    #[instrument(skip_all)]
    pub async fn google_auth(&self, google_token: &str) -> DomainResult<TokenSuccessResponse> {
        let token = self
            .tokens
            .exchange_token(google_token, &self.config.subject_issuer)
            .await?;
        info!("Exchanged Google token, expires in {}s", token.expires_in);
        Ok(token)
    }

    /// Token exchange followed by userinfo with the exchanged token.
    ///
    /// Nothing is undone if the second step fails; the session created by the
    /// exchange stays valid until it expires.
    #[instrument(skip_all)]
    pub async fn login_with_google(&self, google_token: &str) -> DomainResult<JwtGoogleWithUser> {
        let jwt = self
            .google_auth(google_token)
            .await
            .map_err(|e| federated(steps::TOKEN_EXCHANGE, e))?;

        let user = self
            .tokens
            .user_info(&jwt.access_token)
            .await
            .map_err(|e| federated(steps::USER_INFO, e))?;

        info!("User '{}' logged in with Google", user.username);
        Ok(JwtGoogleWithUser { jwt, user })
    }

    #[instrument(skip(self))]
    pub async fn federated_identities(&self, user_id: &str) -> DomainResult<Vec<FederatedIdentity>> {
        let token = self.service_tokens.service_token().await?;
        self.repository.get_federated_identities(&token, user_id).await
    }

    /// Whether the user has a Google link
    #[instrument(skip(self))]
    pub async fn check_federation_google(&self, user_id: &str) -> DomainResult<bool> {
        let identities = self.federated_identities(user_id).await?;

        Ok(identities
            .iter()
            .any(|identity| identity.is_provider(self.identity_provider())))
    }

    /// Link a Google account to the user. Linking twice is left to the
    /// provider to reject.
    #[instrument(skip(self))]
    pub async fn federation_google(
        &self,
        user_id: &str,
        google_user_id: &str,
        google_username: &str,
    ) -> DomainResult<()> {
        let identity =
            FederatedIdentity::new(self.identity_provider(), google_user_id, google_username);

        let token = self.service_tokens.service_token().await?;
        self.repository
            .add_federated_identity(&token, user_id, &identity)
            .await?;

        info!("Linked Google account {} to user {}", google_user_id, user_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn unlink_federation_google(&self, user_id: &str) -> DomainResult<()> {
        let token = self.service_tokens.service_token().await?;
        self.repository
            .remove_federated_identity(&token, user_id, self.identity_provider())
            .await?;

        info!("Removed Google link from user {}", user_id);
        Ok(())
    }

    /// Profile straight from Google, bypassing Keycloak
    #[instrument(skip_all)]
    pub async fn get_user_info_google(
        &self,
        google_access_token: &str,
    ) -> DomainResult<GoogleUserInfo> {
        self.google.get_user_info(google_access_token).await
    }
}

fn federated(step: &str, err: DomainError) -> DomainError {
    if err.is_user_already_exists() {
        return err;
    }

    warn!("Google login failed during {}: {}", step, err);
    DomainError::FederatedLogin {
        step: step.to_string(),
        source: Box::new(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_account_is_not_wrapped() {
        let err = federated(
            steps::TOKEN_EXCHANGE,
            DomainError::UserAlreadyExists {
                message: "User already exists".to_string(),
            },
        );
        assert!(err.is_user_already_exists());
    }

    #[test]
    fn other_failures_carry_the_step() {
        let err = federated(
            steps::USER_INFO,
            DomainError::InvalidToken {
                reason: "expired".to_string(),
            },
        );
        match err {
            DomainError::FederatedLogin { step, source } => {
                assert_eq!(step, "user_info");
                assert!(matches!(*source, DomainError::InvalidToken { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
