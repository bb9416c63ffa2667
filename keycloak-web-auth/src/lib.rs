/*!
# Keycloak Web Auth

Login, user lifecycle and Google federation on top of a Keycloak realm,
using hexagonal architecture principles.

This crate provides:
- Domain models for users, tokens, credentials and federated identities
- Port definitions for the token endpoints, the admin API and Google
- Application services implementing the login and federation use cases
- reqwest-based infrastructure adapters

## Architecture

```text
┌─────────────────────────────────────────────────────────────┐
│                  KeycloakWebAuthClient                      │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│                Application Layer                            │
├─────────────────────────────────────────────────────────────┤
│  • WebAuthService           • GoogleFederationService       │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│                 Domain Layer (Ports)                        │
├─────────────────────────────────────────────────────────────┤
│  • TokenManager             • ServiceTokenProvider          │
│  • UserRepository           • GoogleProfilePort             │
│  • ConfigurationPort                                        │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│              Infrastructure Layer (Adapters)                │
├─────────────────────────────────────────────────────────────┤
│  • KeycloakTokenManager     • ClientCredentialsTokenProvider│
│  • KeycloakRestAdapter      • GoogleUserInfoAdapter         │
│  • EnvConfigurationAdapter                                  │
└─────────────────────────────────────────────────────────────┘
```

## Usage

```no_run
use keycloak_web_auth::{KeycloakWebAuthClient, NewUser};

# async fn run() -> keycloak_web_auth::DomainResult<()> {
let client = KeycloakWebAuthClient::new(
    "http://localhost:8080",
    "my-realm",
    "web-app",
    "client-secret",
);

let user_id = client
    .register(&NewUser::new("jdoe").with_email("jdoe@example.com"), "s3cret")
    .await?;
let tokens = client.login("jdoe", "s3cret").await?;
let me = client.get_user_from_token(&tokens.access_token).await?;
assert_eq!(me.id, user_id.as_str());
# Ok(())
# }
```
*/

pub mod application;
pub mod client;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::ports::*;
pub use application::services::*;
pub use client::KeycloakWebAuthClient;
pub use domain::entities::*;
pub use domain::errors::*;
