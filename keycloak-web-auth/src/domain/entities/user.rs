use super::common::*;
use crate::domain::errors::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal view of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicUser {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// A user record as returned by the admin API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub attributes: Attributes,
}

impl User {
    pub fn to_basic(&self) -> BasicUser {
        BasicUser {
            id: self.id.to_string(),
            username: self.username.clone(),
            email: self.email.clone().unwrap_or_default(),
        }
    }

    /// Get full display name
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.username.clone(),
        }
    }

    /// Validate username according to the provider's accepted characters
    pub fn validate_username(username: &str) -> DomainResult<()> {
        if username.trim().is_empty() {
            return Err(DomainError::Validation {
                field: "username".to_string(),
                message: "Username cannot be empty".to_string(),
            });
        }

        if username.len() > 255 {
            return Err(DomainError::Validation {
                field: "username".to_string(),
                message: "Username cannot exceed 255 characters".to_string(),
            });
        }

        if username.chars().any(char::is_whitespace) {
            return Err(DomainError::Validation {
                field: "username".to_string(),
                message: "Username cannot contain whitespace".to_string(),
            });
        }

        Ok(())
    }

    pub fn validate_email(email: &str) -> DomainResult<()> {
        let invalid = || DomainError::Validation {
            field: "email".to_string(),
            message: format!("Invalid email address: {email}"),
        };

        let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.')
        {
            return Err(invalid());
        }

        Ok(())
    }
}

/// Registration payload for a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub enabled: bool,
    pub email_verified: bool,
    pub attributes: Attributes,
}

impl NewUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            first_name: None,
            last_name: None,
            enabled: true,
            email_verified: false,
            attributes: Attributes::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    pub fn with_email_verified(mut self, verified: bool) -> Self {
        self.email_verified = verified;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.add_attribute(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        User::validate_username(&self.username)?;
        if let Some(ref email) = self.email {
            User::validate_email(email)?;
        }
        Ok(())
    }
}

/// Check a plain password before sending it upstream. Strength policy is the
/// provider's concern; only emptiness is rejected locally.
pub fn validate_password(password: &str) -> DomainResult<()> {
    if password.is_empty() {
        return Err(DomainError::Validation {
            field: "password".to_string(),
            message: "Password cannot be empty".to_string(),
        });
    }
    Ok(())
}
