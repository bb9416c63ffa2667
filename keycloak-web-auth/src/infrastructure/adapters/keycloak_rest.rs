use async_trait::async_trait;
use keycloak::{
    types::{CredentialRepresentation, FederatedIdentityRepresentation, UserRepresentation},
    KeycloakAdmin, KeycloakError, KeycloakTokenSupplier,
};
use reqwest::{header::LOCATION, StatusCode};
use std::collections::HashMap;

use super::provider_errors::is_user_already_exists;
use crate::application::ports::{config::KeycloakConfig, repository::UserRepository};
use crate::domain::{entities::*, errors::*};

/// Hands the admin client the service token acquired for the current operation
#[derive(Debug, Clone)]
pub struct ServiceTokenSupplier {
    token: ServiceToken,
}

impl ServiceTokenSupplier {
    pub fn new(token: ServiceToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl KeycloakTokenSupplier for ServiceTokenSupplier {
    async fn get(&self, _url: &str) -> Result<String, KeycloakError> {
        Ok(self.token.bearer().to_string())
    }
}

/// Keycloak admin REST adapter implementing the UserRepository port
pub struct KeycloakRestAdapter {
    url: String,
    realm: String,
    client: reqwest::Client,
}

impl KeycloakRestAdapter {
    pub fn new(config: &KeycloakConfig, client: reqwest::Client) -> Self {
        Self {
            url: config.base_url().to_string(),
            realm: config.realm.clone(),
            client,
        }
    }

    /// Admin client authorized by `token`. Shares the connection pool.
    fn admin(&self, token: &ServiceToken) -> KeycloakAdmin<ServiceTokenSupplier> {
        KeycloakAdmin::new(
            &self.url,
            ServiceTokenSupplier::new(token.clone()),
            self.client.clone(),
        )
    }
}

/// Reject ids that would change the request path once the URL is normalized.
/// Separators are percent-encoded by the admin client, dot segments are not.
fn path_segment<'a>(field: &str, value: &'a str) -> DomainResult<&'a str> {
    if value.is_empty() || value == "." || value == ".." {
        return Err(DomainError::Validation {
            field: field.to_string(),
            message: format!("'{value}' is not a valid {field}"),
        });
    }
    Ok(value)
}

/// Map an admin API failure. `resource`/`identifier` describe what a 404 means.
fn admin_error(err: KeycloakError, resource: &str, identifier: &str) -> DomainError {
    let (status, body, text) = match err {
        KeycloakError::ReqwestFailure(e) => {
            return DomainError::UpstreamTransport {
                message: e.to_string(),
            }
        }
        KeycloakError::HttpFailure { status, body, text } => (status, body, text),
    };

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = body
        .and_then(|b| b.error_message.or(b.error_description).or(b.error))
        .filter(|m| !m.is_empty())
        .or_else(|| Some(text).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());

    match status {
        StatusCode::NOT_FOUND => DomainError::not_found(resource, identifier),
        status if is_user_already_exists(status, &message) => {
            DomainError::UserAlreadyExists { message }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DomainError::UpstreamAuth { message },
        status => DomainError::Upstream {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl UserRepository for KeycloakRestAdapter {
    async fn find_user_by_id(&self, token: &ServiceToken, user_id: &str) -> DomainResult<User> {
        let id = path_segment("user_id", user_id)?;
        let keycloak_user = self
            .admin(token)
            .realm_users_with_user_id_get(&self.realm, id, None)
            .await
            .map_err(|e| admin_error(e, "User", user_id))?;

        convert_user_from_keycloak(keycloak_user)
    }

    async fn find_users_by_username(
        &self,
        token: &ServiceToken,
        username: &str,
    ) -> DomainResult<Vec<User>> {
        let keycloak_users = self
            .admin(token)
            .realm_users_get(
                &self.realm,
                None,                        // brief_representation
                None,                        // created_after
                None,                        // created_before
                None,                        // email
                None,                        // email_verified
                None,                        // enabled
                Some(true),                  // exact
                None,                        // first
                None,                        // first_name
                None,                        // idp_alias
                None,                        // idp_user_id
                None,                        // last_name
                None,                        // max
                None,                        // q
                None,                        // search
                Some(username.to_string()), // username
            )
            .await
            .map_err(|e| admin_error(e, "User", username))?;

        keycloak_users
            .into_iter()
            .map(convert_user_from_keycloak)
            .collect()
    }

    async fn find_users_by_email(
        &self,
        token: &ServiceToken,
        email: &str,
    ) -> DomainResult<Vec<User>> {
        let keycloak_users = self
            .admin(token)
            .realm_users_get(
                &self.realm,
                None,                     // brief_representation
                None,                     // created_after
                None,                     // created_before
                Some(email.to_string()), // email
                None,                     // email_verified
                None,                     // enabled
                Some(true),               // exact
                None,                     // first
                None,                     // first_name
                None,                     // idp_alias
                None,                     // idp_user_id
                None,                     // last_name
                None,                     // max
                None,                     // q
                None,                     // search
                None,                     // username
            )
            .await
            .map_err(|e| admin_error(e, "User", email))?;

        keycloak_users
            .into_iter()
            .map(convert_user_from_keycloak)
            .collect()
    }

    async fn create_user(&self, token: &ServiceToken, user: &NewUser) -> DomainResult<EntityId> {
        let keycloak_user = convert_user_to_keycloak(user);

        let response = self
            .admin(token)
            .realm_users_post(&self.realm, keycloak_user)
            .await
            .map_err(|e| admin_error(e, "User", &user.username))?;

        // Keycloak answers 201 with the new resource in Location
        let from_location = response
            .as_ref()
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(user_id_from_location);
        if let Some(id) = from_location {
            return Ok(id);
        }

        // Find the created user to get the ID
        tracing::warn!(
            "User '{}' created without a usable Location header, looking it up",
            user.username
        );
        self.find_users_by_username(token, &user.username)
            .await?
            .into_iter()
            .next()
            .map(|u| u.id)
            .ok_or_else(|| DomainError::UpstreamTransport {
                message: "User created but could not retrieve ID".to_string(),
            })
    }

    async fn delete_user(&self, token: &ServiceToken, user_id: &str) -> DomainResult<()> {
        let id = path_segment("user_id", user_id)?;
        self.admin(token)
            .realm_users_with_user_id_delete(&self.realm, id)
            .await
            .map_err(|e| admin_error(e, "User", user_id))?;

        Ok(())
    }

    async fn set_email_verified(
        &self,
        token: &ServiceToken,
        user_id: &str,
        verified: bool,
    ) -> DomainResult<()> {
        let id = path_segment("user_id", user_id)?;
        let mut keycloak_user = UserRepresentation::default();
        keycloak_user.email_verified = Some(verified);

        self.admin(token)
            .realm_users_with_user_id_put(&self.realm, id, keycloak_user)
            .await
            .map_err(|e| admin_error(e, "User", user_id))?;

        Ok(())
    }

    async fn reset_password(
        &self,
        token: &ServiceToken,
        user_id: &str,
        password: &str,
    ) -> DomainResult<()> {
        let id = path_segment("user_id", user_id)?;
        let mut credential = CredentialRepresentation::default();
        credential.type_ = Some(PASSWORD_CREDENTIAL_TYPE.to_string().into());
        credential.value = Some(password.to_string().into());
        credential.temporary = Some(false);

        self.admin(token)
            .realm_users_with_user_id_reset_password_put(&self.realm, id, credential)
            .await
            .map_err(|e| admin_error(e, "User", user_id))?;

        Ok(())
    }

    async fn get_user_credentials(
        &self,
        token: &ServiceToken,
        user_id: &str,
    ) -> DomainResult<Vec<Credential>> {
        let id = path_segment("user_id", user_id)?;
        let keycloak_credentials = self
            .admin(token)
            .realm_users_with_user_id_credentials_get(&self.realm, id)
            .await
            .map_err(|e| admin_error(e, "User", user_id))?;

        Ok(keycloak_credentials
            .into_iter()
            .map(convert_credential_from_keycloak)
            .collect())
    }

    async fn get_federated_identities(
        &self,
        token: &ServiceToken,
        user_id: &str,
    ) -> DomainResult<Vec<FederatedIdentity>> {
        let id = path_segment("user_id", user_id)?;
        let keycloak_identities = self
            .admin(token)
            .realm_users_with_user_id_federated_identity_get(&self.realm, id)
            .await
            .map_err(|e| admin_error(e, "User", user_id))?;

        Ok(keycloak_identities
            .into_iter()
            .map(convert_federated_identity_from_keycloak)
            .collect())
    }

    async fn add_federated_identity(
        &self,
        token: &ServiceToken,
        user_id: &str,
        identity: &FederatedIdentity,
    ) -> DomainResult<()> {
        let id = path_segment("user_id", user_id)?;
        let provider = path_segment("identity_provider", &identity.identity_provider)?;
        let keycloak_identity = convert_federated_identity_to_keycloak(identity);

        self.admin(token)
            .realm_users_with_user_id_federated_identity_with_provider_post(
                &self.realm,
                id,
                provider,
                keycloak_identity,
            )
            .await
            .map_err(|e| admin_error(e, "User", user_id))?;

        Ok(())
    }

    async fn remove_federated_identity(
        &self,
        token: &ServiceToken,
        user_id: &str,
        provider: &str,
    ) -> DomainResult<()> {
        let id = path_segment("user_id", user_id)?;
        let alias = path_segment("identity_provider", provider)?;

        self.admin(token)
            .realm_users_with_user_id_federated_identity_with_provider_delete(
                &self.realm,
                id,
                alias,
            )
            .await
            .map_err(|e| admin_error(e, "Federated identity", provider))?;

        Ok(())
    }
}

/// Last path segment of a `Location` header such as `.../users/{id}`
fn user_id_from_location(location: &str) -> Option<EntityId> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
        .map(EntityId::from)
}

// Conversion methods between domain entities and Keycloak types

fn convert_user_from_keycloak(keycloak_user: UserRepresentation) -> DomainResult<User> {
    let id = keycloak_user
        .id
        .map(|id| EntityId::from_string(id.to_string()))
        .ok_or_else(|| DomainError::UpstreamTransport {
            message: "User representation without id".to_string(),
        })?;
    let username = keycloak_user
        .username
        .map(|u| u.to_string())
        .ok_or_else(|| DomainError::UpstreamTransport {
            message: format!("User {id} has no username"),
        })?;

    let mut attributes = Attributes::new();
    if let Some(attrs) = keycloak_user.attributes {
        for (key, values) in attrs.iter() {
            for value in values.iter() {
                attributes.add_attribute(key.to_string(), value.to_string());
            }
        }
    }

    Ok(User {
        id,
        username,
        email: keycloak_user.email.map(|e| e.to_string()),
        email_verified: keycloak_user.email_verified.unwrap_or(false),
        first_name: keycloak_user.first_name.map(|f| f.to_string()),
        last_name: keycloak_user.last_name.map(|l| l.to_string()),
        enabled: keycloak_user.enabled.unwrap_or(true),
        created_at: keycloak_user
            .created_timestamp
            .and_then(chrono::DateTime::from_timestamp_millis),
        attributes,
    })
}

fn convert_user_to_keycloak(user: &NewUser) -> UserRepresentation {
    let mut keycloak_user = UserRepresentation::default();

    keycloak_user.username = Some(user.username.clone().into());
    keycloak_user.email = user.email.as_ref().map(|e| e.clone().into());
    keycloak_user.email_verified = Some(user.email_verified);
    keycloak_user.first_name = user.first_name.as_ref().map(|f| f.clone().into());
    keycloak_user.last_name = user.last_name.as_ref().map(|l| l.clone().into());
    keycloak_user.enabled = Some(user.enabled);

    if !user.attributes.is_empty() {
        let attrs: HashMap<String, Vec<String>> = user
            .attributes
            .attributes
            .iter()
            .map(|(key, values)| (key.clone(), values.clone()))
            .collect();
        keycloak_user.attributes = Some(attrs.into());
    }

    keycloak_user
}

fn convert_credential_from_keycloak(keycloak_credential: CredentialRepresentation) -> Credential {
    Credential {
        id: keycloak_credential
            .id
            .map(|id| EntityId::from_string(id.to_string())),
        type_: keycloak_credential
            .type_
            .map(|t| t.to_string())
            .unwrap_or_default(),
        user_label: keycloak_credential.user_label.map(|l| l.to_string()),
        created_date: keycloak_credential
            .created_date
            .and_then(chrono::DateTime::from_timestamp_millis),
    }
}

fn convert_federated_identity_from_keycloak(
    keycloak_identity: FederatedIdentityRepresentation,
) -> FederatedIdentity {
    FederatedIdentity {
        identity_provider: keycloak_identity
            .identity_provider
            .map(|p| p.to_string())
            .unwrap_or_default(),
        user_id: keycloak_identity
            .user_id
            .map(|u| u.to_string())
            .unwrap_or_default(),
        user_name: keycloak_identity
            .user_name
            .map(|u| u.to_string())
            .unwrap_or_default(),
    }
}

fn convert_federated_identity_to_keycloak(
    identity: &FederatedIdentity,
) -> FederatedIdentityRepresentation {
    let mut keycloak_identity = FederatedIdentityRepresentation::default();

    keycloak_identity.identity_provider = Some(identity.identity_provider.clone().into());
    keycloak_identity.user_id = Some(identity.user_id.clone().into());
    keycloak_identity.user_name = Some(identity.user_name.clone().into());

    keycloak_identity
}
