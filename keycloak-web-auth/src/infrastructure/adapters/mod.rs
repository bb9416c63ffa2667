pub mod env_config;
pub mod google_userinfo;
pub mod http_request;
pub mod keycloak_rest;
pub mod keycloak_token_manager;
pub mod provider_errors;
pub mod service_token;

pub use env_config::*;
pub use google_userinfo::*;
pub use http_request::{HttpRequest, HttpResponse, RequestError};
pub use keycloak_rest::*;
pub use keycloak_token_manager::*;
pub use provider_errors::{GoogleErrorResponse, OAuthErrorResponse};
pub use service_token::*;
