//! Developer demo pages: the API/cache demo, the configuration overview and
//! the error boundary test.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use lekas_core::{
    ContactForm, CreateUserRequest, Post, PostId, QueryParams, UpdateUserRequest, User, UserId,
};
use serde::Deserialize;
use tracing::instrument;

use crate::config::{BuildInfo, LocaleConfig};
use crate::error::{AppError, Result};
use crate::layout::{Layout, render, render_in};
use crate::query::{QueryError, QueryKey, keys};
use crate::seo::PageMeta;
use crate::state::AppState;

const DEMO_PATH: &str = "/demo/api";
const POST_PREVIEW_CHARS: usize = 100;
const TEST_ERROR_MESSAGE: &str = "This is a test error to demonstrate the error boundary!";

// =============================================================================
// API demo
// =============================================================================

/// Outcome of the last demo mutation, carried through the redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Notice {
    UserCreated,
    UserUpdated,
    UserDeleted,
    ContactSent,
    ContactFailed,
    MutationFailed,
}

impl Notice {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::UserCreated => "User created.",
            Self::UserUpdated => "User updated.",
            Self::UserDeleted => "User deleted.",
            Self::ContactSent => "Contact form submitted successfully!",
            Self::ContactFailed => "Failed to submit contact form",
            Self::MutationFailed => "The request failed. Please try again.",
        }
    }

    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::ContactFailed | Self::MutationFailed)
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::UserCreated => "user-created",
            Self::UserUpdated => "user-updated",
            Self::UserDeleted => "user-deleted",
            Self::ContactSent => "contact-sent",
            Self::ContactFailed => "contact-failed",
            Self::MutationFailed => "mutation-failed",
        }
    }
}

/// Query string of `GET /demo/api`.
#[derive(Debug, Default, Deserialize)]
pub struct DemoQuery {
    pub user: Option<u64>,
    pub post: Option<u64>,
    pub notice: Option<Notice>,
}

/// Freshness of one cache key, for the status table.
#[derive(Debug, Clone)]
pub struct CacheRow {
    pub key: String,
    pub status: &'static str,
}

#[derive(Template, WebTemplate)]
#[template(path = "demo/api.html")]
pub struct ApiDemoTemplate {
    pub layout: Layout,
    pub users: Vec<User>,
    pub users_error: bool,
    pub selected_user: UserId,
    pub user: Option<User>,
    pub user_error: bool,
    pub posts: Vec<Post>,
    pub selected_post: PostId,
    pub post: Option<Post>,
    pub post_preview: String,
    pub notice: Option<Notice>,
    pub cache: Vec<CacheRow>,
}

/// Split a query result into data and an error flag. Rejected credentials
/// abort the page so the visitor is sent to login.
fn loaded<T>(result: std::result::Result<T, QueryError>) -> Result<(Option<T>, bool)> {
    match result {
        Ok(value) => Ok((Some(value), false)),
        Err(QueryError::Api(e)) if e.is_unauthorized() => Err(AppError::Api(e)),
        Err(e) => {
            tracing::warn!(error = %e, "Demo query failed");
            Ok((None, true))
        }
    }
}

async fn cache_row(state: &AppState, key: QueryKey) -> CacheRow {
    let query_state = state.query().query_state(&key).await;
    let status = match (query_state.updated_at, query_state.is_fetching, query_state.is_stale) {
        (_, true, _) => "fetching",
        (None, false, _) => "empty",
        (Some(_), false, true) => "stale",
        (Some(_), false, false) => "fresh",
    };
    CacheRow {
        key: key.to_string(),
        status,
    }
}

/// Display the API demo.
///
/// # Errors
///
/// Redirects to login when the API rejects our credentials.
#[instrument(skip(state))]
pub async fn api_demo(
    State(state): State<AppState>,
    query: std::result::Result<Query<DemoQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) = query?;
    let selected_user = UserId::new(query.user.unwrap_or(1));
    let selected_post = PostId::new(query.post.unwrap_or(1));
    let users_params = QueryParams::limit(5);
    let posts_params = QueryParams::limit(3);

    let (users, user, posts, post) = tokio::join!(
        state.users().users(&users_params),
        state.users().user(selected_user),
        state.posts().posts(&posts_params),
        state.posts().post(selected_post),
    );
    let (users, users_error) = loaded(users)?;
    let (user, user_error) = loaded(user)?;
    let (posts, _) = loaded(posts)?;
    let (post, _) = loaded(post)?;

    let mut cache = Vec::new();
    for key in [
        keys::users_list(&users_params),
        keys::user(selected_user),
        keys::posts_list(&posts_params),
        keys::post(selected_post),
        keys::contact(),
    ] {
        cache.push(cache_row(&state, key).await);
    }

    let meta = PageMeta::new(DEMO_PATH)
        .title(state.seo().format_title("API Demo"))
        .no_index();

    Ok(render(&ApiDemoTemplate {
        layout: Layout::new(&state, &meta),
        users: users.unwrap_or_default(),
        users_error,
        selected_user,
        user,
        user_error,
        posts: posts.unwrap_or_default(),
        selected_post,
        post_preview: post
            .as_ref()
            .map(|p| p.excerpt(POST_PREVIEW_CHARS))
            .unwrap_or_default(),
        post,
        notice: query.notice,
        cache,
    }))
}

/// Back to the demo page, keeping the user selection.
fn back_to_demo(user: Option<UserId>, notice: Notice) -> Response {
    let target = match user {
        Some(id) => format!("{DEMO_PATH}?user={id}&notice={}", notice.as_str()),
        None => format!("{DEMO_PATH}?notice={}", notice.as_str()),
    };
    Redirect::to(&target).into_response()
}

/// Map a mutation result to a redirect. Rejected credentials go to login.
fn after_mutation<T>(
    result: std::result::Result<T, QueryError>,
    user: impl FnOnce(&T) -> Option<UserId>,
    success: Notice,
    failure: Notice,
) -> Result<Response> {
    match result {
        Ok(value) => Ok(back_to_demo(user(&value), success)),
        Err(QueryError::Api(e)) if e.is_unauthorized() => Err(AppError::Api(e)),
        Err(e) => {
            tracing::warn!(error = %e, "Demo mutation failed");
            Ok(back_to_demo(None, failure))
        }
    }
}

/// Create the demo user.
///
/// # Errors
///
/// Redirects to login when the API rejects our credentials.
#[instrument(skip(state))]
pub async fn create_user(State(state): State<AppState>) -> Result<Response> {
    let request = CreateUserRequest {
        name: "John Doe".to_string(),
        username: "johndoe".to_string(),
        email: "john@example.com".to_string(),
        phone: Some("123-456-7890".to_string()),
        website: None,
    };
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let result = state.users().create(&request).await;
    after_mutation(
        result,
        |user| Some(user.id),
        Notice::UserCreated,
        Notice::MutationFailed,
    )
}

/// Append " (Updated)" to a user's name, optimistically.
///
/// # Errors
///
/// Redirects to login when the API rejects our credentials.
#[instrument(skip(state))]
pub async fn update_user(
    State(state): State<AppState>,
    id: std::result::Result<Path<u64>, PathRejection>,
) -> Result<Response> {
    let Path(id) = id?;
    let id = UserId::new(id);
    let current = match state.users().user(id).await {
        Ok(user) => user,
        Err(e) => {
            return after_mutation::<User>(
                Err(e),
                |_| None,
                Notice::UserUpdated,
                Notice::MutationFailed,
            );
        }
    };

    let request = UpdateUserRequest {
        name: Some(format!("{} (Updated)", current.name)),
        ..UpdateUserRequest::default()
    };
    let result = state.users().optimistic_update(id, &request).await;
    after_mutation(
        result,
        |user| Some(user.id),
        Notice::UserUpdated,
        Notice::MutationFailed,
    )
}

/// Delete a user.
///
/// # Errors
///
/// Redirects to login when the API rejects our credentials.
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    id: std::result::Result<Path<u64>, PathRejection>,
) -> Result<Response> {
    let Path(id) = id?;
    let result = state.users().delete(UserId::new(id)).await;
    after_mutation(result, |_| None, Notice::UserDeleted, Notice::MutationFailed)
}

/// Submit the canned test contact form.
///
/// # Errors
///
/// Redirects to login when the API rejects our credentials.
#[instrument(skip(state))]
pub async fn submit_contact(State(state): State<AppState>) -> Result<Response> {
    let form = ContactForm {
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        subject: "Test Subject".to_string(),
        message: "This is a test message from the API demo.".to_string(),
        phone: None,
        company: None,
    };

    let result = state.contact().submit(&form).await;
    after_mutation(result, |_| None, Notice::ContactSent, Notice::ContactFailed)
}

// =============================================================================
// Configuration demo
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "demo/config.html")]
pub struct ConfigDemoTemplate {
    pub layout: Layout,
    pub environment: String,
    pub is_development: bool,
    pub api_url: String,
    pub build: BuildInfo,
    pub features: Vec<(&'static str, bool)>,
    pub analytics_enabled: bool,
    pub ga4: bool,
    pub facebook: bool,
    pub hotjar: bool,
    pub locale: LocaleConfig,
    pub stale_secs: u64,
    pub gc_secs: u64,
    pub retries: u32,
}

/// Display the configuration overview.
///
/// # Errors
///
/// Returns 404 unless dev tools are enabled.
#[instrument(skip(state))]
pub async fn config_demo(State(state): State<AppState>) -> Result<Response> {
    let config = state.config();
    if !config.features.dev_tools {
        return Err(AppError::NotFound("/demo/config".to_string()));
    }

    let meta = PageMeta::new("/demo/config")
        .title(state.seo().format_title("Configuration"))
        .no_index();

    Ok(render(&ConfigDemoTemplate {
        layout: Layout::new(&state, &meta),
        environment: config.environment.to_string(),
        is_development: config.environment.is_development(),
        api_url: config.api.base_url.to_string(),
        build: config.build.clone(),
        features: config.features.entries(),
        analytics_enabled: config.analytics_enabled(),
        ga4: config.analytics.ga4_measurement_id.is_some(),
        facebook: config.analytics.facebook_pixel_id.is_some(),
        hotjar: config.analytics.hotjar_id.is_some(),
        locale: config.locale.clone(),
        stale_secs: config.cache.stale_time.as_secs(),
        gc_secs: config.cache.gc_time.as_secs(),
        retries: config.cache.retries,
    }))
}

// =============================================================================
// Error boundary test
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ErrorTestQuery {
    #[serde(default)]
    pub trigger: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "demo/error_test.html")]
pub struct ErrorTestTemplate {
    pub layout: Layout,
}

/// Display the error boundary test, or fail on purpose with `?trigger=true`.
///
/// The page renders through the long-lived boundary in [`AppState`]. The
/// error page's "Try Again" link leads back here without the trigger, which
/// resets that boundary before rendering.
///
/// # Errors
///
/// Returns 404 unless dev tools are enabled.
#[instrument(skip(state))]
pub async fn error_test(
    State(state): State<AppState>,
    query: std::result::Result<Query<ErrorTestQuery>, QueryRejection>,
) -> Result<Response> {
    if !state.config().features.dev_tools {
        return Err(AppError::NotFound("/error-test".to_string()));
    }
    let Query(query) = query?;

    let meta = PageMeta::new("/error-test")
        .title(state.seo().format_title("Error Boundary Test"))
        .no_index();
    let page = ErrorTestTemplate {
        layout: Layout::new(&state, &meta),
    };

    let mut boundary = state
        .error_test_boundary()
        .lock()
        .map_err(|_| AppError::Internal("error test boundary lock poisoned".to_string()))?;
    if !query.trigger && boundary.has_failed() {
        tracing::info!("Resetting error test boundary");
        boundary.reset();
    }

    Ok(render_in(&mut boundary, || {
        if query.trigger {
            return Err(TEST_ERROR_MESSAGE.to_string());
        }
        page.render().map_err(|e| e.to_string())
    }))
}

/// Create the demo routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/demo/api", get(api_demo))
        .route("/demo/api/users", post(create_user))
        .route("/demo/api/users/{id}/update", post(update_user))
        .route("/demo/api/users/{id}/delete", post(delete_user))
        .route("/demo/api/contact", post(submit_contact))
        .route("/demo/config", get(config_demo))
        .route("/error-test", get(error_test))
}
