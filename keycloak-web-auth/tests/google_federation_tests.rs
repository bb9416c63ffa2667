mod mocks;

use keycloak_web_auth::{DomainError, NewUser};
use mocks::{google_profile, mock_client};

#[tokio::test]
async fn federation_check_flips_after_linking() {
    let (client, _mock) = mock_client();
    let user_id = client
        .register(&NewUser::new("jane"), "s3cret")
        .await
        .unwrap();

    assert!(!client.check_federation_google(user_id.as_str()).await.unwrap());

    client
        .federation_google(user_id.as_str(), "109876", "jane@gmail.com")
        .await
        .unwrap();

    assert!(client.check_federation_google(user_id.as_str()).await.unwrap());

    let identities = client.federated_identities(user_id.as_str()).await.unwrap();
    assert_eq!(identities.len(), 1);
    assert_eq!(identities[0].identity_provider, "google");
    assert_eq!(identities[0].user_id, "109876");
    assert_eq!(identities[0].user_name, "jane@gmail.com");
}

#[tokio::test]
async fn unlinking_removes_the_google_identity() {
    let (client, _mock) = mock_client();
    let user_id = client
        .register(&NewUser::new("jane"), "s3cret")
        .await
        .unwrap();
    client
        .federation_google(user_id.as_str(), "109876", "jane@gmail.com")
        .await
        .unwrap();

    client
        .unlink_federation_google(user_id.as_str())
        .await
        .unwrap();

    assert!(!client.check_federation_google(user_id.as_str()).await.unwrap());
    assert!(client
        .unlink_federation_google(user_id.as_str())
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn login_with_google_creates_and_resolves_user() {
    let (client, mock) = mock_client();
    mock.add_google_account("ya29.google", google_profile("109876", "jane@gmail.com"));

    let result = client.login_with_google("ya29.google").await.unwrap();
    assert!(!result.jwt.access_token.is_empty());
    assert!(result.jwt.has_refresh_token());
    assert_eq!(result.user.email, "jane@gmail.com");

    assert!(client.check_federation_google(&result.user.id).await.unwrap());

    // A second login reuses the linked account
    let again = client.login_with_google("ya29.google").await.unwrap();
    assert_eq!(again.user.id, result.user.id);
}

#[tokio::test]
async fn google_auth_keeps_token_fields() {
    let (client, mock) = mock_client();
    mock.add_google_account("ya29.google", google_profile("109876", "jane@gmail.com"));

    let token = client.google_auth("ya29.google").await.unwrap();
    assert!(!token.access_token.is_empty());
    assert!(!token.refresh_token.is_empty());
    assert_eq!(token.expires_in, 300);
    assert!(token.scopes().any(|s| s == "openid"));
}

#[tokio::test]
async fn existing_unlinked_account_surfaces_user_already_exists() {
    let (client, mock) = mock_client();
    client
        .register(
            &NewUser::new("jane").with_email("jane@gmail.com"),
            "s3cret",
        )
        .await
        .unwrap();
    mock.add_google_account("ya29.google", google_profile("109876", "jane@gmail.com"));

    let err = client.login_with_google("ya29.google").await.unwrap_err();
    assert!(err.is_user_already_exists());
    assert_eq!(err.status_hint(), 409);
}

#[tokio::test]
async fn rejected_google_token_is_wrapped_with_its_step() {
    let (client, _mock) = mock_client();

    let err = client.login_with_google("unknown").await.unwrap_err();
    match err {
        DomainError::FederatedLogin { step, source } => {
            assert_eq!(step, "token_exchange");
            assert!(matches!(*source, DomainError::UpstreamAuth { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn google_profile_is_read_directly() {
    let (client, mock) = mock_client();
    mock.add_google_account("ya29.google", google_profile("109876", "jane@gmail.com"));

    let info = client.get_user_info_google("ya29.google").await.unwrap();
    assert_eq!(info.id, "109876");
    assert!(info.verified_email);
    assert_eq!(info.given_name, "Jane");

    let err = client.get_user_info_google("expired").await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidToken { .. }));
}
