//! Error and not-found pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use tracing::instrument;

use crate::error::{AppError, ErrorPageKind};
use crate::layout::Layout;
use crate::seo::PageMeta;
use crate::state::AppState;

/// Last-resort body when even the error template cannot render.
const FALLBACK_ERROR_HTML: &str = "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
    <title>Something went wrong | Lekas</title></head><body><h1>Oops! Something went wrong</h1>\
    <p><a href=\"/\">Go to Homepage</a></p></body></html>";

/// 404 page template.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub layout: Layout,
}

/// Error page template.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub layout: Layout,
    /// Technical details, development only
    pub details: Option<String>,
    pub request_id: Option<String>,
    /// Where "Try Again" leads
    pub retry_path: String,
}

/// Request facts the error page shows.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub path: String,
    pub request_id: Option<String>,
    pub detail: String,
}

fn not_found_meta(state: &AppState, path: &str) -> PageMeta {
    PageMeta::new(path)
        .title(state.seo().format_title("404 - Page Not Found"))
        .description(
            "The page you are looking for could not be found. Return to Lekas homepage or \
             contact us for assistance.",
        )
        .no_index()
}

fn error_meta(state: &AppState, path: &str) -> PageMeta {
    PageMeta::new(path)
        .title(state.seo().format_title("Something went wrong"))
        .description(
            "An unexpected error occurred. Please try again or contact support if the \
             problem persists.",
        )
        .no_index()
}

/// Render the page for `kind` with `status`.
pub fn error_page(
    state: &AppState,
    status: StatusCode,
    kind: ErrorPageKind,
    context: &ErrorContext,
) -> Response {
    let rendered = match kind {
        ErrorPageKind::NotFound => NotFoundTemplate {
            layout: Layout::new(state, &not_found_meta(state, &context.path)),
        }
        .render(),
        ErrorPageKind::Failed => ErrorTemplate {
            layout: Layout::new(state, &error_meta(state, &context.path)),
            details: state
                .config()
                .environment
                .is_development()
                .then(|| context.detail.clone()),
            request_id: context.request_id.clone(),
            retry_path: context.path.clone(),
        }
        .render(),
    };

    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render error page");
            (status, Html(FALLBACK_ERROR_HTML)).into_response()
        }
    }
}

/// Fallback for unmatched routes.
///
/// # Errors
///
/// Always returns [`AppError::NotFound`].
#[instrument]
pub async fn not_found(uri: Uri) -> Result<Response, AppError> {
    Err(AppError::NotFound(uri.path().to_string()))
}
