//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Home page
//! GET  /about-us                    - About page
//! GET  /service                     - Services page
//! GET  /contact                     - Contact form
//! POST /contact                     - Submit contact form
//! GET  /page                        - Placeholder page
//! GET  /health                      - Health check
//!
//! # Demos
//! GET  /demo/api                    - API and cache demo (?user=&post=)
//! POST /demo/api/users              - Create the demo user
//! POST /demo/api/users/{id}/update  - Optimistically rename a user
//! POST /demo/api/users/{id}/delete  - Delete a user
//! POST /demo/api/contact            - Submit the test contact form
//! GET  /demo/config                 - Configuration overview (dev tools)
//! GET  /error-test                  - Error boundary test (dev tools)
//!
//! GET  /static/*                    - Stylesheet and images
//! *    anything else                - 404 page
//! ```

pub mod contact;
pub mod demo;
pub mod errors;
pub mod pages;

use std::path::Path;

use axum::{Router, middleware::from_fn, middleware::from_fn_with_state, routing::get};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::{
    error_pages_middleware, handle_panic, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Directory the stylesheet and images are served from.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(pages::router())
        .merge(contact::router())
        .merge(demo::router())
        .route("/health", get(health))
        .fallback(errors::not_found)
}

/// The complete application: routes, static files and the middleware stack.
pub fn app(state: AppState) -> Router {
    app_with_static_dir(state, Path::new(STATIC_DIR))
}

/// [`app`] serving static files from `static_dir`.
pub fn app_with_static_dir(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .merge(routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn_with_state(state.clone(), error_pages_middleware))
        .layer(from_fn_with_state(state.clone(), security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::config::SiteConfig;

    fn state_with(vars: &[(&str, &str)]) -> AppState {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let config = SiteConfig::from_vars(|key| vars.get(key).cloned()).unwrap();
        AppState::new(config).unwrap()
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_home_page_renders_with_active_nav() {
        let (status, _, body) = get(app(state_with(&[])), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Welcome to Lekas"));
        assert!(body.contains("<title>Lekas - Professional Services &amp; Business Solutions"));
        assert!(body.contains(r#"<a href="/" class="nav-link active""#));
        assert!(body.contains(r#"<a href="/contact" class="nav-link""#));
    }

    #[tokio::test]
    async fn test_unknown_path_renders_not_found_page() {
        let (status, _, body) = get(app(state_with(&[])), "/no/such/page").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Page Not Found"));
        assert!(body.contains("404 - Page Not Found | Lekas"));
        assert!(body.contains("noindex, nofollow"));
    }

    #[tokio::test]
    async fn test_health_and_security_headers() {
        let (status, headers, body) = get(app(state_with(&[])), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_error_test_shows_details_in_development() {
        let state = state_with(&[("LEKAS_ENABLE_DEV_TOOLS", "true")]);
        let (status, _, body) = get(app(state), "/error-test?trigger=true").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Oops! Something went wrong"));
        assert!(body.contains("This is a test error to demonstrate the error boundary!"));
        assert!(body.contains(r#"href="/error-test""#));
    }

    #[tokio::test]
    async fn test_error_test_try_again_resets_boundary() {
        let state = state_with(&[("LEKAS_ENABLE_DEV_TOOLS", "true")]);

        let (status, _, _) = get(app(state.clone()), "/error-test?trigger=true").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(state.error_test_boundary().lock().unwrap().has_failed());

        // The "Try Again" link
        let (status, _, body) = get(app(state.clone()), "/error-test").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Trigger Error"));
        assert!(!state.error_test_boundary().lock().unwrap().has_failed());
    }

    #[tokio::test]
    async fn test_dev_pages_hidden_without_dev_tools() {
        let state = state_with(&[("LEKAS_ENVIRONMENT", "production")]);

        let (status, _, body) = get(app(state.clone()), "/error-test").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Page Not Found"));

        let (status, _, _) = get(app(state), "/demo/config").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_demo_query_gets_error_page() {
        let (status, _, body) = get(app(state_with(&[])), "/demo/api?user=abc").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Oops! Something went wrong"));
        assert!(body.contains("<nav"));
    }

    #[tokio::test]
    async fn test_malformed_demo_path_gets_error_page() {
        let request = Request::builder()
            .method("POST")
            .uri("/demo/api/users/abc/delete")
            .body(Body::empty())
            .unwrap();

        let response = app(state_with(&[])).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Oops! Something went wrong"));
    }

    #[tokio::test]
    async fn test_invalid_contact_form_keeps_input() {
        let request = Request::builder()
            .method("POST")
            .uri("/contact")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(
                "name=Jane+Doe&email=not-an-email&subject=Hello&message=Hi+there",
            ))
            .unwrap();

        let response = app(state_with(&[])).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(r#"value="Jane Doe""#));
        assert!(body.contains("alert-error"));
    }
}
