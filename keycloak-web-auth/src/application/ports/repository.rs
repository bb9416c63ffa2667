use crate::domain::{entities::*, errors::DomainResult};
use async_trait::async_trait;

/// Admin operations on realm users. Every call is authorized by the given
/// service token.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_id(&self, token: &ServiceToken, user_id: &str) -> DomainResult<User>;

    /// Exact-match username search. The provider answers with a list.
    async fn find_users_by_username(
        &self,
        token: &ServiceToken,
        username: &str,
    ) -> DomainResult<Vec<User>>;

    async fn find_users_by_email(
        &self,
        token: &ServiceToken,
        email: &str,
    ) -> DomainResult<Vec<User>>;

    /// Create a user and return the id the provider assigned
    async fn create_user(&self, token: &ServiceToken, user: &NewUser) -> DomainResult<EntityId>;

    async fn delete_user(&self, token: &ServiceToken, user_id: &str) -> DomainResult<()>;

    async fn set_email_verified(
        &self,
        token: &ServiceToken,
        user_id: &str,
        verified: bool,
    ) -> DomainResult<()>;

    /// Set a non-temporary password
    async fn reset_password(
        &self,
        token: &ServiceToken,
        user_id: &str,
        password: &str,
    ) -> DomainResult<()>;

    async fn get_user_credentials(
        &self,
        token: &ServiceToken,
        user_id: &str,
    ) -> DomainResult<Vec<Credential>>;

    async fn get_federated_identities(
        &self,
        token: &ServiceToken,
        user_id: &str,
    ) -> DomainResult<Vec<FederatedIdentity>>;

    async fn add_federated_identity(
        &self,
        token: &ServiceToken,
        user_id: &str,
        identity: &FederatedIdentity,
    ) -> DomainResult<()>;

    async fn remove_federated_identity(
        &self,
        token: &ServiceToken,
        user_id: &str,
        provider: &str,
    ) -> DomainResult<()>;
}

/// Direct access to Google's profile API
#[async_trait]
pub trait GoogleProfilePort: Send + Sync {
    async fn get_user_info(&self, google_access_token: &str) -> DomainResult<GoogleUserInfo>;
}
