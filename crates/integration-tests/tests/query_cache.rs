//! Integration tests for the query cache on top of the real API client.

#![allow(clippy::unwrap_used)]

use lekas_core::{
    ContactId, ContactStatus, ContactSubmission, CreatePostRequest, Post, PostId, QueryParams,
    UpdatePostRequest, UpdateUserRequest, User, UserId,
};
use lekas_integration_tests::{
    CREATED_POST_ID, LOCKED_USER_ID, MISSING_USER_ID, MockApi, TestSite,
};
use lekas_site::query::keys;

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_repeated_reads_hit_the_api_once() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;

    let first = site.state.users().user(UserId::new(42)).await.unwrap();
    let second = site.state.users().user(UserId::new(42)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.name, "User 42");
    assert_eq!(api.count("GET", "/users/42"), 1);
}

#[tokio::test]
async fn test_concurrent_reads_share_one_request() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    let users = site.state.users();

    let (a, b, c) = tokio::join!(
        users.user(UserId::new(7)),
        users.user(UserId::new(7)),
        users.user(UserId::new(7)),
    );

    assert_eq!(a.unwrap().id, UserId::new(7));
    assert!(b.is_ok() && c.is_ok());
    assert_eq!(api.count("GET", "/users/7"), 1);
}

#[tokio::test]
async fn test_failed_reads_are_retried() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    api.fail_user_lookups(2);

    let user = site.state.users().user(UserId::new(5)).await.unwrap();

    assert_eq!(user.id, UserId::new(5));
    assert_eq!(api.count("GET", "/users/5"), 3);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;

    let err = site
        .state
        .users()
        .user(UserId::new(MISSING_USER_ID))
        .await
        .unwrap_err();

    assert_eq!(err.api().map(|e| e.status()), Some(404));
    assert_eq!(api.count("GET", &format!("/users/{MISSING_USER_ID}")), 1);
}

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn test_creating_a_post_refreshes_lists_and_caches_the_post() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    let posts = site.state.posts();
    let params = QueryParams::limit(3);

    assert_eq!(posts.posts(&params).await.unwrap().len(), 3);
    assert_eq!(api.count("GET", "/posts"), 1);

    let created = posts
        .create(&CreatePostRequest {
            title: "Launch".to_string(),
            body: "We are live.".to_string(),
            user_id: UserId::new(1),
        })
        .await
        .unwrap();
    assert_eq!(created.title, "Launch");
    assert_eq!(api.count("POST", "/posts"), 1);

    // The list was invalidated, the new post was written to the cache
    posts.posts(&params).await.unwrap();
    assert_eq!(api.count("GET", "/posts"), 2);

    let cached = posts.post(created.id).await.unwrap();
    assert_eq!(cached.title, "Launch");
    assert_eq!(api.count("GET", &format!("/posts/{CREATED_POST_ID}")), 0);
}

#[tokio::test]
async fn test_update_overwrites_cached_user() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    let users = site.state.users();
    let id = UserId::new(2);

    users.user(id).await.unwrap();
    let request = UpdateUserRequest {
        name: Some("Renamed".to_string()),
        ..UpdateUserRequest::default()
    };
    users.update(id, &request).await.unwrap();

    let cached: Option<User> = site.state.query().get_query_data(&keys::user(id)).await;
    assert_eq!(cached.unwrap().name, "Renamed");

    users.user(id).await.unwrap();
    assert_eq!(api.count("GET", "/users/2"), 1);
    assert_eq!(api.count("PUT", "/users/2"), 1);
}

#[tokio::test]
async fn test_delete_forgets_cached_user() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    let users = site.state.users();
    let id = UserId::new(3);

    users.user(id).await.unwrap();
    users.delete(id).await.unwrap();

    let cached: Option<User> = site.state.query().get_query_data(&keys::user(id)).await;
    assert!(cached.is_none());
    assert_eq!(api.count("DELETE", "/users/3"), 1);
}

#[tokio::test]
async fn test_optimistic_update_shows_change_then_refetches() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    let users = site.state.users();
    let id = UserId::new(4);

    users.user(id).await.unwrap();
    let request = UpdateUserRequest {
        name: Some("User 4 (Updated)".to_string()),
        ..UpdateUserRequest::default()
    };
    let updated = users.optimistic_update(id, &request).await.unwrap();
    assert_eq!(updated.name, "User 4 (Updated)");

    let cached: Option<User> = site.state.query().get_query_data(&keys::user(id)).await;
    assert_eq!(cached.unwrap().name, "User 4 (Updated)");

    // Invalidated afterwards, so the next read goes back to the API
    users.user(id).await.unwrap();
    assert_eq!(api.count("GET", "/users/4"), 2);
}

#[tokio::test]
async fn test_failed_optimistic_update_rolls_back() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    let users = site.state.users();
    let id = UserId::new(LOCKED_USER_ID);

    let original = users.user(id).await.unwrap();
    let request = UpdateUserRequest {
        name: Some("Never saved".to_string()),
        ..UpdateUserRequest::default()
    };
    let err = users.optimistic_update(id, &request).await.unwrap_err();
    assert_eq!(err.api().map(|e| e.status()), Some(500));

    let key = keys::user(id);
    let cached: Option<User> = site.state.query().get_query_data(&key).await;
    assert_eq!(cached.unwrap(), original);
    assert!(site.state.query().query_state(&key).await.is_stale);
}

// =============================================================================
// Posts
// =============================================================================

#[tokio::test]
async fn test_posts_by_user_filters_and_caches() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    let posts = site.state.posts();

    let by_user = posts.posts_by_user(UserId::new(2)).await.unwrap();
    assert!(by_user.iter().all(|post| post.user_id == UserId::new(2)));
    posts.posts_by_user(UserId::new(2)).await.unwrap();

    let call = api.last("GET", "/posts").unwrap();
    assert_eq!(call.query.as_deref(), Some("userId=2"));
    assert_eq!(api.count("GET", "/posts"), 1);

    // A new post by that user makes the list stale
    posts
        .create(&CreatePostRequest {
            title: "Another".to_string(),
            body: "More news.".to_string(),
            user_id: UserId::new(2),
        })
        .await
        .unwrap();
    posts.posts_by_user(UserId::new(2)).await.unwrap();
    assert_eq!(api.count("GET", "/posts"), 2);
}

#[tokio::test]
async fn test_post_update_overwrites_cached_post() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    let posts = site.state.posts();
    let id = PostId::new(2);

    posts.post(id).await.unwrap();
    let request = UpdatePostRequest {
        title: Some("Edited".to_string()),
        ..UpdatePostRequest::default()
    };
    let updated = posts.update(id, &request).await.unwrap();
    assert_eq!(updated.title, "Edited");
    assert_eq!(api.count("PUT", "/posts/2"), 1);

    let cached = posts.post(id).await.unwrap();
    assert_eq!(cached.title, "Edited");
    assert_eq!(api.count("GET", "/posts/2"), 1);
}

#[tokio::test]
async fn test_post_delete_forgets_post_and_stales_lists() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    let posts = site.state.posts();
    let params = QueryParams::limit(3);
    let id = PostId::new(3);

    posts.posts(&params).await.unwrap();
    posts.post(id).await.unwrap();
    posts.delete(id).await.unwrap();
    assert_eq!(api.count("DELETE", "/posts/3"), 1);

    let cached: Option<Post> = site.state.query().get_query_data(&keys::post(id)).await;
    assert!(cached.is_none());

    posts.posts(&params).await.unwrap();
    assert_eq!(api.count("GET", "/posts"), 2);
}

// =============================================================================
// Contact submissions
// =============================================================================

#[tokio::test]
async fn test_submissions_are_cached() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    let contact = site.state.contact();

    let all = contact.submissions().await.unwrap();
    assert_eq!(all.len(), 2);
    contact.submissions().await.unwrap();
    assert_eq!(api.count("GET", "/contact/submissions"), 1);

    let one = contact.submission(ContactId::new(2)).await.unwrap();
    assert_eq!(one.id, ContactId::new(2));
    assert_eq!(one.status, ContactStatus::Pending);
    contact.submission(ContactId::new(2)).await.unwrap();
    assert_eq!(api.count("GET", "/contact/2"), 1);
}

#[tokio::test]
async fn test_status_update_overwrites_detail_and_stales_list() {
    let api = MockApi::start().await;
    let site = TestSite::start(&api).await;
    let contact = site.state.contact();
    let id = ContactId::new(1);

    contact.submissions().await.unwrap();
    contact.submission(id).await.unwrap();

    let updated = contact
        .update_status(id, ContactStatus::Closed)
        .await
        .unwrap();
    assert_eq!(updated.status, ContactStatus::Closed);
    assert_eq!(api.count("PATCH", "/contact/1"), 1);

    let cached: Option<ContactSubmission> = site
        .state
        .query()
        .get_query_data(&keys::contact_submission(id))
        .await;
    assert_eq!(cached.unwrap().status, ContactStatus::Closed);
    assert!(site.state.query().query_state(&keys::contact()).await.is_stale);

    // Moving backwards is still sent
    let reopened = contact
        .update_status(id, ContactStatus::Pending)
        .await
        .unwrap();
    assert_eq!(reopened.status, ContactStatus::Pending);
    assert_eq!(api.count("PATCH", "/contact/1"), 2);
    assert_eq!(api.count("GET", "/contact/1"), 1);
}
