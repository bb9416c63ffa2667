//! Register, log in and inspect a user against a running Keycloak.
//!
//! ```text
//! KEYCLOAK_URL=http://localhost:8080 KEYCLOAK_REALM=demo \
//! KEYCLOAK_CLIENT_ID=web KEYCLOAK_CLIENT_SECRET=... \
//! cargo run --example login_flow
//! ```

use keycloak_web_auth::{
    infrastructure::telemetry::init_tracing, AppConfig, DomainError, KeycloakWebAuthClient,
    NewUser,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.logging)?;

    let client = KeycloakWebAuthClient::from_config(&config)?;

    let new_user = NewUser::new("demo-user")
        .with_email("demo-user@example.com")
        .with_name("Demo", "User");

    let user_id = match client.register(&new_user, "demo-password").await {
        Ok(id) => id,
        Err(DomainError::UserAlreadyExists { .. }) => {
            client.get_user_by_username("demo-user").await?.id
        }
        Err(e) => return Err(e.into()),
    };
    println!("User id: {user_id}");

    let tokens = client.login("demo-user", "demo-password").await?;
    println!("Access token expires in {}s", tokens.expires_in);

    let me = client.get_user_from_token(&tokens.access_token).await?;
    println!("Logged in as {} <{}>", me.username, me.email);

    println!(
        "Has password: {}, linked to Google: {}",
        client.user_has_password(user_id.as_str()).await?,
        client.check_federation_google(user_id.as_str()).await?
    );

    client.logout(&tokens.refresh_token).await?;
    Ok(())
}
