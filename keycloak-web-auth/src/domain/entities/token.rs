use super::user::BasicUser;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// OAuth2 token set returned by the provider's token endpoint.
///
/// Used for password login, refresh and token exchange alike. Fields other
/// than `access_token` are optional on the wire and default when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSuccessResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_expires_in: i64,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub id_token: String,
    #[serde(rename = "not-before-policy", default)]
    pub not_before_policy: i64,
    #[serde(default)]
    pub session_state: String,
    #[serde(default)]
    pub scope: String,
}

impl TokenSuccessResponse {
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split_whitespace()
    }

    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

/// Result of a Google login: the provider's token set and the local user it
/// resolved to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtGoogleWithUser {
    pub jwt: TokenSuccessResponse,
    pub user: BasicUser,
}

/// Bearer token obtained with the client-credentials grant
#[derive(Debug, Clone)]
pub struct ServiceToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl ServiceToken {
    /// `expires_in` beyond what chrono can represent saturates at the
    /// latest representable instant; negative values mean already expired.
    pub fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            expires_at: seconds_from_now(expires_in.max(0)).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// A window too large to represent counts as expiring
    pub fn is_expiring_soon(&self, seconds: i64) -> bool {
        seconds_from_now(seconds).map_or(true, |deadline| deadline >= self.expires_at)
    }

    pub fn bearer(&self) -> &str {
        &self.access_token
    }
}

fn seconds_from_now(seconds: i64) -> Option<DateTime<Utc>> {
    Duration::try_seconds(seconds).and_then(|delta| Utc::now().checked_add_signed(delta))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_reads_keycloak_shape() {
        let json = r#"{
            "access_token": "at",
            "expires_in": 300,
            "refresh_expires_in": 1800,
            "refresh_token": "rt",
            "token_type": "Bearer",
            "not-before-policy": 0,
            "session_state": "abc",
            "scope": "openid email profile"
        }"#;
        let token: TokenSuccessResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "at");
        assert_eq!(token.refresh_expires_in, 1800);
        assert_eq!(token.id_token, "");
        assert_eq!(token.scopes().collect::<Vec<_>>(), vec!["openid", "email", "profile"]);
        assert!(token.has_refresh_token());
    }

    #[test]
    fn service_token_expiry_window() {
        let token = ServiceToken::new("t".to_string(), 60);
        assert!(!token.is_expired());
        assert!(!token.is_expiring_soon(10));
        assert!(token.is_expiring_soon(120));

        let stale = ServiceToken::new("t".to_string(), 0);
        assert!(stale.is_expired());
    }

    #[test]
    fn out_of_range_lifetimes_saturate() {
        let forever = ServiceToken::new("t".to_string(), i64::MAX);
        assert!(!forever.is_expired());
        assert_eq!(forever.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!forever.is_expiring_soon(3600));

        let negative = ServiceToken::new("t".to_string(), i64::MIN);
        assert!(negative.is_expired());
    }

    #[test]
    fn huge_refresh_window_counts_as_expiring() {
        let token = ServiceToken::new("t".to_string(), 300);
        assert!(token.is_expiring_soon(100_000_000_000_000));
        assert!(token.is_expiring_soon(i64::MAX));
    }
}
