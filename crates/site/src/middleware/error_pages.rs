//! Turns marked error responses into full HTML error pages.
//!
//! Handlers, the page error boundary and the panic handler all answer with a
//! bare response carrying an [`ErrorPage`] marker. This middleware sees the
//! marker on the way out and renders the matching page with the site layout.

use std::any::Any;

use axum::{
    extract::{Request, State},
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::request_id::RequestId;
use crate::boundary::CaughtError;
use crate::error::{AppError, ErrorPage};
use crate::routes::errors::{ErrorContext, error_page};
use crate::state::AppState;

/// Render error pages for marked responses.
pub async fn error_pages_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.as_str().to_string());

    let response = next.run(request).await;
    let Some(marker) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };

    let status = response.status();
    let mut page = error_page(
        &state,
        status,
        marker.kind,
        &ErrorContext {
            path,
            request_id,
            detail: marker.detail,
        },
    );

    // Keep headers the handler set, such as the request ID.
    let (parts, _) = response.into_parts();
    for (name, value) in &parts.headers {
        if name != CONTENT_TYPE && name != CONTENT_LENGTH {
            page.headers_mut().insert(name.clone(), value.clone());
        }
    }
    page
}

/// `CatchPanicLayer` handler: a panicking handler gets the error page.
#[allow(clippy::needless_pass_by_value)]
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    AppError::Render(CaughtError::from_panic(payload.as_ref())).into_response()
}
