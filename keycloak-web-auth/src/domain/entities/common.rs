use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Provider identifier of an entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User attributes as key-value pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub attributes: HashMap<String, Vec<String>>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_attribute(&mut self, key: String, value: String) {
        self.attributes.entry(key).or_default().push(value);
    }

    pub fn get_single_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)?.first()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

pub const PASSWORD_CREDENTIAL_TYPE: &str = "password";

/// A credential stored for a user upstream. Secret material is never read back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: Option<EntityId>,
    pub type_: String,
    pub user_label: Option<String>,
    pub created_date: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(type_: impl Into<String>) -> Self {
        Self {
            id: None,
            type_: type_.into(),
            user_label: None,
            created_date: None,
        }
    }

    pub fn is_password(&self) -> bool {
        self.type_ == PASSWORD_CREDENTIAL_TYPE
    }
}

/// Link between a local account and an account at an external identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedIdentity {
    pub identity_provider: String,
    pub user_id: String,
    pub user_name: String,
}

impl FederatedIdentity {
    pub fn new(
        identity_provider: impl Into<String>,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            identity_provider: identity_provider.into(),
            user_id: user_id.into(),
            user_name: user_name.into(),
        }
    }

    pub fn is_provider(&self, alias: &str) -> bool {
        self.identity_provider == alias
    }
}
