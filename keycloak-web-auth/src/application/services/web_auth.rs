use crate::{
    application::ports::*,
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Login, session and user administration use cases
#[derive(Clone)]
pub struct WebAuthService {
    tokens: Arc<dyn TokenManager>,
    service_tokens: Arc<dyn ServiceTokenProvider>,
    repository: Arc<dyn UserRepository>,
}

impl WebAuthService {
    pub fn new(
        tokens: Arc<dyn TokenManager>,
        service_tokens: Arc<dyn ServiceTokenProvider>,
        repository: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            tokens,
            service_tokens,
            repository,
        }
    }

    /// Authenticate with username (or email) and password
    #[instrument(skip(self, password), fields(username = %username_or_email))]
    pub async fn login(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> DomainResult<TokenSuccessResponse> {
        match self.tokens.password_grant(username_or_email, password).await {
            Ok(token) => {
                info!("User '{}' logged in", username_or_email);
                Ok(token)
            }
            Err(e) => {
                warn!("Login failed for '{}': {}", username_or_email, e);
                Err(e)
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn refresh_token(&self, refresh_token: &str) -> DomainResult<TokenSuccessResponse> {
        let token = self.tokens.refresh_grant(refresh_token).await?;
        info!("Token refreshed, expires in {}s", token.expires_in);
        Ok(token)
    }

    /// Revoke an access or refresh token. Revoking twice is not an error.
    #[instrument(skip_all)]
    pub async fn revoke_token(&self, token: &str) -> DomainResult<()> {
        self.tokens.revoke(token).await?;
        info!("Token revoked");
        Ok(())
    }

    /// End the session the refresh token belongs to
    #[instrument(skip_all)]
    pub async fn logout(&self, refresh_token: &str) -> DomainResult<()> {
        self.tokens.logout(refresh_token).await?;
        info!("Session ended");
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn get_user_from_token(&self, access_token: &str) -> DomainResult<BasicUser> {
        let user = self.tokens.user_info(access_token).await?;
        info!("Resolved token to user '{}' ({})", user.username, user.id);
        Ok(user)
    }

    /// Create a user and set its password.
    ///
    /// If the password cannot be set the new user is deleted again and
    /// [`DomainError::PartialFailure`] is returned. `rolled_back` is false when
    /// that deletion failed too, in which case the account exists without a
    /// password.
    #[instrument(skip(self, user, password), fields(username = %user.username))]
    pub async fn register(&self, user: &NewUser, password: &str) -> DomainResult<EntityId> {
        user.validate()?;
        validate_password(password)?;

        let token = self.service_tokens.service_token().await?;
        let user_id = self.repository.create_user(&token, user).await?;
        info!("Created user '{}' with id {}", user.username, user_id);

        if let Err(e) = self
            .repository
            .reset_password(&token, user_id.as_str(), password)
            .await
        {
            warn!("Setting password for new user {} failed: {}", user_id, e);

            let rolled_back = match self.repository.delete_user(&token, user_id.as_str()).await {
                Ok(()) => {
                    info!("Rolled back creation of user {}", user_id);
                    true
                }
                Err(delete_err) => {
                    error!(
                        "User {} was created without a password and could not be deleted: {}",
                        user_id, delete_err
                    );
                    false
                }
            };

            return Err(DomainError::PartialFailure {
                user_id: user_id.to_string(),
                rolled_back,
                reason: e.to_string(),
            });
        }

        info!("Registered user '{}'", user.username);
        Ok(user_id)
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: &str) -> DomainResult<()> {
        let token = self.service_tokens.service_token().await?;
        self.repository.delete_user(&token, user_id).await?;
        info!("Deleted user {}", user_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_user_id(&self, user_id: &str) -> DomainResult<User> {
        let token = self.service_tokens.service_token().await?;
        self.repository.find_user_by_id(&token, user_id).await
    }

    /// Exact username lookup. An empty result is `NotFound`.
    #[instrument(skip(self))]
    pub async fn get_user_by_username(&self, username: &str) -> DomainResult<User> {
        let token = self.service_tokens.service_token().await?;
        let users = self.repository.find_users_by_username(&token, username).await?;

        first_match(users, "User", username)
    }

    /// Exact email lookup. An empty result is `NotFound`.
    #[instrument(skip(self))]
    pub async fn get_user_by_email(&self, email: &str) -> DomainResult<User> {
        let token = self.service_tokens.service_token().await?;
        let users = self.repository.find_users_by_email(&token, email).await?;

        first_match(users, "User", email)
    }

    #[instrument(skip(self))]
    pub async fn verify_email(&self, user_id: &str) -> DomainResult<()> {
        let token = self.service_tokens.service_token().await?;
        self.repository.set_email_verified(&token, user_id, true).await?;
        info!("Marked email of user {} as verified", user_id);
        Ok(())
    }

    #[instrument(skip(self, password))]
    pub async fn set_password_user(&self, user_id: &str, password: &str) -> DomainResult<()> {
        validate_password(password)?;

        let token = self.service_tokens.service_token().await?;
        self.repository.reset_password(&token, user_id, password).await?;
        info!("Password set for user {}", user_id);
        Ok(())
    }

    /// Whether any of the user's credentials is a password
    #[instrument(skip(self))]
    pub async fn user_has_password(&self, user_id: &str) -> DomainResult<bool> {
        let token = self.service_tokens.service_token().await?;
        let credentials = self.repository.get_user_credentials(&token, user_id).await?;

        Ok(credentials.iter().any(Credential::is_password))
    }
}

fn first_match(users: Vec<User>, resource: &str, identifier: &str) -> DomainResult<User> {
    users.into_iter().next().ok_or_else(|| {
        info!("{} '{}' not found", resource, identifier);
        DomainError::not_found(resource, identifier)
    })
}
