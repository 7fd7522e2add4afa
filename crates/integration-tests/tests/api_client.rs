//! Integration tests for the REST API client.
//!
//! Runs against the in-process mock API; no network access needed.

#![allow(clippy::unwrap_used)]

use lekas_core::{UpdateUserRequest, User, UserId};
use lekas_integration_tests::{MISSING_USER_ID, MockApi, TEST_TOKEN, TestSite};
use lekas_site::api::{CredentialStore, LOGIN_PATH, NETWORK_ERROR_MESSAGE, UserService};
use lekas_site::state::AppState;

// =============================================================================
// Credentials
// =============================================================================

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;

    let user: User = site.state.api().get("/users/3").await.unwrap();
    assert_eq!(user.id, UserId::new(3));

    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].authorization.as_deref(),
        Some(format!("Bearer {TEST_TOKEN}").as_str())
    );
}

#[tokio::test]
async fn test_unauthorized_clears_token_and_navigates_to_login() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    let users = UserService::new(site.state.api().clone());

    let err = users.profile().await.unwrap_err();
    assert_eq!(err.status(), 401);
    assert_eq!(err.message(), "Token expired");
    assert!(err.is_unauthorized());

    assert!(site.state.api().credentials().token().is_none());
    assert_eq!(site.navigations(), vec![LOGIN_PATH.to_string()]);

    // The next request goes out without a token
    users.get(UserId::new(1)).await.unwrap();
    let last = api.calls().pop().unwrap();
    assert_eq!(last.path, "/users/1");
    assert_eq!(last.authorization, None);
}

#[tokio::test]
async fn test_calls_outside_a_page_get_their_own_request_ids() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;

    let _: User = site.state.api().get("/users/1").await.unwrap();
    let _: User = site.state.api().get("/users/2").await.unwrap();

    let ids: Vec<String> = api
        .calls()
        .into_iter()
        .map(|call| call.request_id.unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

// =============================================================================
// Services
// =============================================================================

#[tokio::test]
async fn test_patch_sends_partial_update() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    let users = UserService::new(site.state.api().clone());

    let request = UpdateUserRequest {
        email: Some("new@example.com".to_string()),
        ..UpdateUserRequest::default()
    };
    let user = users.patch(UserId::new(6), &request).await.unwrap();

    assert_eq!(user.id, UserId::new(6));
    assert_eq!(user.email, "new@example.com");
    // Untouched fields come back as they were
    assert_eq!(user.name, "User 6");
    assert_eq!(api.count("PATCH", "/users/6"), 1);
    assert_eq!(api.count("PUT", "/users/6"), 0);
}

// =============================================================================
// Error normalization
// =============================================================================

#[tokio::test]
async fn test_not_found_is_normalized() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    let users = UserService::new(site.state.api().clone());

    let err = users.get(UserId::new(MISSING_USER_ID)).await.unwrap_err();
    assert_eq!(err.status(), 404);
    assert_eq!(err.message(), "User not found");
    assert!(err.is_not_found());
    assert_eq!(
        err.data().and_then(|d| d.get("message")).and_then(|m| m.as_str()),
        Some("User not found")
    );

    // Not a 401, so credentials survive
    assert!(site.state.api().credentials().token().is_some());
    assert!(site.navigations().is_empty());
}

#[tokio::test]
async fn test_unreachable_api_is_a_network_error() {
    // Grab a free port, then close it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let base_url = format!("http://{addr}");
    let config = lekas_site::config::SiteConfig::from_vars(|key| match key {
        "LEKAS_API_BASE_URL" => Some(base_url.clone()),
        _ => None,
    })
    .unwrap();
    let state = AppState::new(config).unwrap();

    let err = UserService::new(state.api().clone())
        .get(UserId::new(1))
        .await
        .unwrap_err();
    assert_eq!(err.status(), 0);
    assert_eq!(err.message(), NETWORK_ERROR_MESSAGE);
}
