//! Integration test harness for the Lekas website.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lekas-integration-tests
//! ```
//!
//! Nothing external is needed: [`MockApi`] stands in for the REST API on a
//! random local port and [`TestSite`] runs the real site against it.
//!
//! # Test Categories
//!
//! - `api_client` - bearer tokens, error normalization, the 401 flow
//! - `query_cache` - de-duplication, invalidation, retries
//! - `site` - pages, forms and headers over real HTTP

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use lekas_site::api::{CredentialStore, MemoryCredentialStore, Navigator};
use lekas_site::config::SiteConfig;
use lekas_site::routes;
use lekas_site::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// Token every [`TestSite`] starts with.
pub const TEST_TOKEN: &str = "test-token";

/// User ID the mock answers with a 404.
pub const MISSING_USER_ID: u64 = 404;

/// ID the mock assigns to every created post.
pub const CREATED_POST_ID: u64 = 101;

/// Subject the mock rejects contact forms for.
pub const REJECTED_SUBJECT: &str = "Reject me";

/// User ID the mock refuses to update with a 500.
pub const LOCKED_USER_ID: u64 = 500;

/// Header the site sends the request correlation ID in.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// Mock REST API
// =============================================================================

/// One request the mock API received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Default)]
struct MockState {
    calls: Mutex<Vec<Call>>,
    /// Upcoming `GET /users/{id}` requests to answer with a 503
    user_failures: AtomicU32,
}

/// In-process stand-in for the REST API, recording every request.
pub struct MockApi {
    pub base_url: Url,
    state: Arc<MockState>,
    _server: JoinHandle<()>,
}

impl MockApi {
    /// Start the mock on a random local port.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let router = Router::new()
            .route("/users", get(list_users).post(create_user))
            .route("/users/me", get(profile))
            .route(
                "/users/{id}",
                get(get_user)
                    .put(update_user)
                    .patch(update_user)
                    .delete(delete_resource),
            )
            .route("/posts", get(list_posts).post(create_post))
            .route(
                "/posts/{id}",
                get(get_post).put(update_post).delete(delete_resource),
            )
            .route("/contact", post(submit_contact))
            .route("/contact/submissions", get(list_submissions))
            .route("/contact/{id}", get(get_submission).patch(update_submission))
            .layer(from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let (addr, server) = serve(router).await;
        Self {
            base_url: Url::parse(&format!("http://{addr}")).expect("Failed to build mock URL"),
            state,
            _server: server,
        }
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().expect("Mock call log poisoned").clone()
    }

    /// How many `method path` requests were received, ignoring query strings.
    #[must_use]
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    /// The most recent `method path` request.
    #[must_use]
    pub fn last(&self, method: &str, path: &str) -> Option<Call> {
        self.calls()
            .into_iter()
            .rev()
            .find(|call| call.method == method && call.path == path)
    }

    /// Answer the next `times` user lookups with a 503.
    pub fn fail_user_lookups(&self, times: u32) {
        self.state.user_failures.store(times, Ordering::SeqCst);
    }
}

async fn record(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    let call = Call {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        authorization: header(request.headers(), AUTHORIZATION.as_str()),
        request_id: header(request.headers(), REQUEST_ID_HEADER),
    };
    state.calls.lock().expect("Mock call log poisoned").push(call);
    next.run(request).await
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn user_json(id: u64) -> Value {
    json!({
        "id": id,
        "name": format!("User {id}"),
        "username": format!("user{id}"),
        "email": format!("user{id}@example.com"),
        "phone": "555-0100",
        "website": "example.com",
        "address": {
            "street": "Main St",
            "suite": "Apt. 1",
            "city": "Springfield",
            "zipcode": "12345",
            "geo": { "lat": "0", "lng": "0" }
        },
        "company": { "name": "Acme", "catchPhrase": "Quality first", "bs": "synergy" }
    })
}

fn post_json(id: u64) -> Value {
    json!({
        "id": id,
        "userId": 1,
        "title": format!("Post {id}"),
        "body": "Lorem ipsum dolor sit amet, consectetur adipiscing elit."
    })
}

/// Copy the fields of `body` over `base`.
fn merged(mut base: Value, body: Value) -> Value {
    if let (Some(base), Value::Object(body)) = (base.as_object_mut(), body) {
        base.extend(body);
    }
    base
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn list_users() -> Json<Value> {
    Json(Value::Array((1..=3).map(user_json).collect()))
}

async fn get_user(State(state): State<Arc<MockState>>, Path(id): Path<u64>) -> Response {
    let failing = state
        .user_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Service unavailable");
    }
    if id == MISSING_USER_ID {
        return error(StatusCode::NOT_FOUND, "User not found");
    }
    Json(user_json(id)).into_response()
}

async fn profile() -> Response {
    error(StatusCode::UNAUTHORIZED, "Token expired")
}

async fn create_user(Json(body): Json<Value>) -> Response {
    (StatusCode::CREATED, Json(merged(user_json(11), body))).into_response()
}

async fn update_user(Path(id): Path<u64>, Json(body): Json<Value>) -> Response {
    if id == LOCKED_USER_ID {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "User is locked");
    }
    Json(merged(user_json(id), body)).into_response()
}

async fn delete_resource() -> Json<Value> {
    Json(json!({}))
}

async fn list_posts(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let posts = (1..=3).map(post_json);
    match params.get("userId").and_then(|id| id.parse::<u64>().ok()) {
        Some(user_id) => Json(Value::Array(
            posts.map(|post| merged(post, json!({ "userId": user_id }))).collect(),
        )),
        None => Json(Value::Array(posts.collect())),
    }
}

async fn get_post(Path(id): Path<u64>) -> Json<Value> {
    Json(post_json(id))
}

async fn update_post(Path(id): Path<u64>, Json(body): Json<Value>) -> Json<Value> {
    Json(merged(post_json(id), body))
}

async fn create_post(Json(body): Json<Value>) -> Response {
    (
        StatusCode::CREATED,
        Json(merged(post_json(CREATED_POST_ID), body)),
    )
        .into_response()
}

fn submission_json(id: u64) -> Value {
    json!({
        "id": id,
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "subject": "Website",
        "message": "We would like a quote.",
        "status": "pending",
        "submittedAt": "2024-01-01T00:00:00Z"
    })
}

async fn list_submissions() -> Json<Value> {
    Json(Value::Array((1..=2).map(submission_json).collect()))
}

async fn get_submission(Path(id): Path<u64>) -> Json<Value> {
    Json(submission_json(id))
}

async fn update_submission(Path(id): Path<u64>, Json(body): Json<Value>) -> Json<Value> {
    Json(merged(submission_json(id), body))
}

async fn submit_contact(Json(body): Json<Value>) -> Response {
    if body.get("subject").and_then(Value::as_str) == Some(REJECTED_SUBJECT) {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "Subject rejected");
    }
    let submission = merged(
        json!({ "id": 7, "status": "pending", "submittedAt": "2024-01-01T00:00:00Z" }),
        body,
    );
    (StatusCode::CREATED, Json(submission)).into_response()
}

// =============================================================================
// Site under test
// =============================================================================

/// The real site, wired to a [`MockApi`] and listening on a random port.
pub struct TestSite {
    pub base_url: String,
    pub state: AppState,
    /// Client that does not follow redirects
    pub client: reqwest::Client,
    navigations: Arc<Mutex<Vec<String>>>,
    _server: JoinHandle<()>,
}

impl TestSite {
    /// Start the site against `api` with the default test settings.
    pub async fn start(api: &MockApi) -> Self {
        Self::start_with(api, &[]).await
    }

    /// Start the site with extra environment variables.
    ///
    /// Retries use millisecond delays so failing reads settle quickly.
    pub async fn start_with(api: &MockApi, extra: &[(&str, &str)]) -> Self {
        let mut vars: HashMap<String, String> = HashMap::from([
            ("LEKAS_API_BASE_URL".to_string(), api.base_url.to_string()),
            ("LEKAS_API_TIMEOUT_SECS".to_string(), "5".to_string()),
            ("LEKAS_QUERY_RETRY_BASE_MS".to_string(), "10".to_string()),
            ("LEKAS_QUERY_RETRY_MAX_MS".to_string(), "40".to_string()),
        ]);
        vars.extend(extra.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));

        let config = SiteConfig::from_vars(|key| vars.get(key).cloned())
            .expect("Failed to load test configuration");

        let credentials: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::with_token(
            SecretString::from(TEST_TOKEN),
        ));
        let navigations = Arc::new(Mutex::new(Vec::new()));
        let recorded = navigations.clone();
        let navigator: Arc<dyn Navigator> = Arc::new(move |path: &str| {
            recorded
                .lock()
                .expect("Navigation log poisoned")
                .push(path.to_string());
        });

        let state = AppState::with_parts(config, credentials, navigator)
            .expect("Failed to build application state");
        let (addr, server) = serve(routes::app(state.clone())).await;

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{addr}"),
            state,
            client,
            navigations,
            _server: server,
        }
    }

    /// Absolute URL of a site path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Navigations the API client requested, oldest first.
    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.navigations
            .lock()
            .expect("Navigation log poisoned")
            .clone()
    }
}

async fn serve(router: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server failed");
    });
    (addr, server)
}
