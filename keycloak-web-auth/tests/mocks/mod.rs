#![allow(dead_code)]

use async_trait::async_trait;
use keycloak_web_auth::{
    application::ports::{
        auth::{ServiceTokenProvider, TokenManager},
        config::GoogleConfig,
        repository::{GoogleProfilePort, UserRepository},
    },
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
    KeycloakWebAuthClient,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password: Option<String>,
    identities: Vec<FederatedIdentity>,
}

/// A Google account known to the mock, keyed by its access token
#[derive(Debug, Clone)]
pub struct GoogleAccount {
    pub token: String,
    pub info: GoogleUserInfo,
}

/// In-memory stand-in for a Keycloak realm and Google, implementing every port
pub struct MockKeycloak {
    users: Arc<Mutex<HashMap<String, StoredUser>>>,
    sessions: Arc<Mutex<HashMap<String, String>>>, // access/refresh token -> user id
    google_accounts: Arc<Mutex<HashMap<String, GoogleUserInfo>>>,
    user_counter: Arc<Mutex<u32>>,
    token_counter: Arc<Mutex<u32>>,
    pub service_token_calls: Arc<Mutex<u32>>,
    pub fail_reset_password: Arc<Mutex<bool>>,
    pub fail_delete: Arc<Mutex<bool>>,
}

impl MockKeycloak {
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            google_accounts: Arc::new(Mutex::new(HashMap::new())),
            user_counter: Arc::new(Mutex::new(0)),
            token_counter: Arc::new(Mutex::new(0)),
            service_token_calls: Arc::new(Mutex::new(0)),
            fail_reset_password: Arc::new(Mutex::new(false)),
            fail_delete: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set_fail_reset_password(&self, fail: bool) {
        *self.fail_reset_password.lock().unwrap() = fail;
    }

    pub fn set_fail_delete(&self, fail: bool) {
        *self.fail_delete.lock().unwrap() = fail;
    }

    pub fn service_token_calls(&self) -> u32 {
        *self.service_token_calls.lock().unwrap()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn add_google_account(&self, token: &str, info: GoogleUserInfo) {
        self.google_accounts
            .lock()
            .unwrap()
            .insert(token.to_string(), info);
    }

    fn generate_user_id(&self) -> String {
        let mut counter = self.user_counter.lock().unwrap();
        *counter += 1;
        format!("user-{}", counter)
    }

    fn issue_tokens(&self, user_id: &str) -> TokenSuccessResponse {
        let n = {
            let mut counter = self.token_counter.lock().unwrap();
            *counter += 1;
            *counter
        };
        let access_token = format!("access-{n}");
        let refresh_token = format!("refresh-{n}");

        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(access_token.clone(), user_id.to_string());
        sessions.insert(refresh_token.clone(), user_id.to_string());

        TokenSuccessResponse {
            access_token,
            expires_in: 300,
            refresh_expires_in: 1800,
            refresh_token,
            token_type: "Bearer".to_string(),
            id_token: String::new(),
            not_before_policy: 0,
            session_state: format!("session-{n}"),
            scope: "openid email profile".to_string(),
        }
    }

    fn session_user(&self, token: &str) -> DomainResult<String> {
        self.sessions
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| DomainError::InvalidToken {
                reason: "Token is not active".to_string(),
            })
    }

    fn with_user<T>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut StoredUser) -> T,
    ) -> DomainResult<T> {
        let mut users = self.users.lock().unwrap();
        users
            .get_mut(user_id)
            .map(f)
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }

    fn insert_user(&self, new_user: &NewUser) -> String {
        let id = self.generate_user_id();
        let user = User {
            id: EntityId::from(id.as_str()),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            email_verified: new_user.email_verified,
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            enabled: new_user.enabled,
            created_at: Some(chrono::Utc::now()),
            attributes: new_user.attributes.clone(),
        };
        self.users.lock().unwrap().insert(
            id.clone(),
            StoredUser {
                user,
                password: None,
                identities: Vec::new(),
            },
        );
        id
    }
}

#[async_trait]
impl TokenManager for MockKeycloak {
    async fn password_grant(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> DomainResult<TokenSuccessResponse> {
        let user_id = {
            let users = self.users.lock().unwrap();
            users
                .values()
                .find(|stored| {
                    (stored.user.username == username_or_email
                        || stored.user.email.as_deref() == Some(username_or_email))
                        && stored.password.as_deref() == Some(password)
                })
                .map(|stored| stored.user.id.to_string())
        };

        match user_id {
            Some(id) => Ok(self.issue_tokens(&id)),
            None => Err(DomainError::InvalidCredentials {
                message: "Invalid user credentials".to_string(),
            }),
        }
    }

    async fn refresh_grant(&self, refresh_token: &str) -> DomainResult<TokenSuccessResponse> {
        let user_id = self.session_user(refresh_token)?;
        Ok(self.issue_tokens(&user_id))
    }

    async fn revoke(&self, token: &str) -> DomainResult<()> {
        self.sessions.lock().unwrap().remove(token);
        Ok(())
    }

    async fn logout(&self, refresh_token: &str) -> DomainResult<()> {
        let user_id = self.session_user(refresh_token)?;
        self.sessions
            .lock()
            .unwrap()
            .retain(|_, owner| *owner != user_id);
        Ok(())
    }

    async fn exchange_token(
        &self,
        subject_token: &str,
        subject_issuer: &str,
    ) -> DomainResult<TokenSuccessResponse> {
        if subject_issuer != "google" {
            return Err(DomainError::UpstreamAuth {
                message: format!("Invalid subject_issuer: {subject_issuer}"),
            });
        }

        let info = self
            .google_accounts
            .lock()
            .unwrap()
            .get(subject_token)
            .cloned()
            .ok_or_else(|| DomainError::UpstreamAuth {
                message: "Invalid token".to_string(),
            })?;

        let existing = {
            let users = self.users.lock().unwrap();
            users
                .values()
                .find(|stored| stored.user.email.as_deref() == Some(info.email.as_str()))
                .map(|stored| {
                    let linked = stored
                        .identities
                        .iter()
                        .any(|i| i.is_provider("google") && i.user_id == info.id);
                    (stored.user.id.to_string(), linked)
                })
        };

        let user_id = match existing {
            Some((id, true)) => id,
            Some((_, false)) => {
                return Err(DomainError::UserAlreadyExists {
                    message: "User already exists".to_string(),
                })
            }
            None => {
                let id = self.insert_user(
                    &NewUser::new(info.email.clone())
                        .with_email(info.email.clone())
                        .with_email_verified(info.verified_email),
                );
                self.with_user(&id, |stored| {
                    stored
                        .identities
                        .push(FederatedIdentity::new("google", &info.id, &info.email))
                })?;
                id
            }
        };

        Ok(self.issue_tokens(&user_id))
    }

    async fn user_info(&self, access_token: &str) -> DomainResult<BasicUser> {
        let user_id = self.session_user(access_token)?;
        self.with_user(&user_id, |stored| stored.user.to_basic())
    }
}

#[async_trait]
impl ServiceTokenProvider for MockKeycloak {
    async fn service_token(&self) -> DomainResult<ServiceToken> {
        *self.service_token_calls.lock().unwrap() += 1;
        Ok(ServiceToken::new("service-token".to_string(), 300))
    }
}

#[async_trait]
impl UserRepository for MockKeycloak {
    async fn find_user_by_id(&self, _token: &ServiceToken, user_id: &str) -> DomainResult<User> {
        self.with_user(user_id, |stored| stored.user.clone())
    }

    async fn find_users_by_username(
        &self,
        _token: &ServiceToken,
        username: &str,
    ) -> DomainResult<Vec<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .filter(|stored| stored.user.username == username)
            .map(|stored| stored.user.clone())
            .collect())
    }

    async fn find_users_by_email(
        &self,
        _token: &ServiceToken,
        email: &str,
    ) -> DomainResult<Vec<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .filter(|stored| stored.user.email.as_deref() == Some(email))
            .map(|stored| stored.user.clone())
            .collect())
    }

    async fn create_user(&self, _token: &ServiceToken, user: &NewUser) -> DomainResult<EntityId> {
        let duplicate = self
            .users
            .lock()
            .unwrap()
            .values()
            .any(|stored| stored.user.username == user.username);
        if duplicate {
            return Err(DomainError::UserAlreadyExists {
                message: "User exists with same username".to_string(),
            });
        }

        Ok(EntityId::from(self.insert_user(user)))
    }

    async fn delete_user(&self, _token: &ServiceToken, user_id: &str) -> DomainResult<()> {
        if *self.fail_delete.lock().unwrap() {
            return Err(DomainError::Upstream {
                status: 500,
                message: "Mock delete failure".to_string(),
            });
        }

        self.users
            .lock()
            .unwrap()
            .remove(user_id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }

    async fn set_email_verified(
        &self,
        _token: &ServiceToken,
        user_id: &str,
        verified: bool,
    ) -> DomainResult<()> {
        self.with_user(user_id, |stored| stored.user.email_verified = verified)
    }

    async fn reset_password(
        &self,
        _token: &ServiceToken,
        user_id: &str,
        password: &str,
    ) -> DomainResult<()> {
        if *self.fail_reset_password.lock().unwrap() {
            return Err(DomainError::Upstream {
                status: 400,
                message: "invalidPasswordMinLengthMessage".to_string(),
            });
        }

        self.with_user(user_id, |stored| stored.password = Some(password.to_string()))
    }

    async fn get_user_credentials(
        &self,
        _token: &ServiceToken,
        user_id: &str,
    ) -> DomainResult<Vec<Credential>> {
        self.with_user(user_id, |stored| {
            stored
                .password
                .as_ref()
                .map(|_| vec![Credential::new(PASSWORD_CREDENTIAL_TYPE)])
                .unwrap_or_default()
        })
    }

    async fn get_federated_identities(
        &self,
        _token: &ServiceToken,
        user_id: &str,
    ) -> DomainResult<Vec<FederatedIdentity>> {
        self.with_user(user_id, |stored| stored.identities.clone())
    }

    async fn add_federated_identity(
        &self,
        _token: &ServiceToken,
        user_id: &str,
        identity: &FederatedIdentity,
    ) -> DomainResult<()> {
        let result = self.with_user(user_id, |stored| {
            if stored
                .identities
                .iter()
                .any(|i| i.identity_provider == identity.identity_provider)
            {
                false
            } else {
                stored.identities.push(identity.clone());
                true
            }
        })?;

        if result {
            Ok(())
        } else {
            Err(DomainError::UserAlreadyExists {
                message: "User is already linked with provider".to_string(),
            })
        }
    }

    async fn remove_federated_identity(
        &self,
        _token: &ServiceToken,
        user_id: &str,
        provider: &str,
    ) -> DomainResult<()> {
        let removed = self.with_user(user_id, |stored| {
            let before = stored.identities.len();
            stored.identities.retain(|i| !i.is_provider(provider));
            before != stored.identities.len()
        })?;

        if removed {
            Ok(())
        } else {
            Err(DomainError::not_found("Federated identity", provider))
        }
    }
}

#[async_trait]
impl GoogleProfilePort for MockKeycloak {
    async fn get_user_info(&self, google_access_token: &str) -> DomainResult<GoogleUserInfo> {
        self.google_accounts
            .lock()
            .unwrap()
            .get(google_access_token)
            .cloned()
            .ok_or_else(|| DomainError::InvalidToken {
                reason: "Invalid Credentials".to_string(),
            })
    }
}

/// A client wired entirely to one mock
pub fn mock_client() -> (KeycloakWebAuthClient, Arc<MockKeycloak>) {
    let mock = Arc::new(MockKeycloak::new());
    let client = KeycloakWebAuthClient::from_parts(
        mock.clone(),
        mock.clone(),
        mock.clone(),
        mock.clone(),
        GoogleConfig::default(),
    );
    (client, mock)
}

pub fn google_profile(id: &str, email: &str) -> GoogleUserInfo {
    GoogleUserInfo {
        id: id.to_string(),
        email: email.to_string(),
        verified_email: true,
        name: "Jane Doe".to_string(),
        given_name: "Jane".to_string(),
        family_name: "Doe".to_string(),
        ..Default::default()
    }
}
