//! Request ID middleware for request tracing and correlation.
//!
//! Reuses the ID set by an upstream proxy when it looks sane, otherwise
//! generates a UUID v4. The request ID is:
//! - Recorded in the current tracing span
//! - Added to the Sentry scope for error correlation
//! - Stored as a [`RequestId`] request extension for handlers
//! - Scoped to the handler's task, so API calls it makes carry it
//! - Returned in the response headers

use std::future::Future;

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs, incoming and outgoing.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static CURRENT_REQUEST_ID: String;
}

/// ID of the page request being served on this task, if any.
#[must_use]
pub fn current_request_id() -> Option<String> {
    CURRENT_REQUEST_ID.try_with(Clone::clone).ok()
}

/// Wrap `fut` so it sees the caller's request ID when polled on another task.
pub fn carry_request_id<F: Future>(fut: F) -> impl Future<Output = F::Output> {
    let request_id = current_request_id();
    async move {
        match request_id {
            Some(id) => CURRENT_REQUEST_ID.scope(id, fut).await,
            None => fut.await,
        }
    }
}

const MAX_REQUEST_ID_LEN: usize = 64;

/// The current request's ID, available as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Accept upstream IDs that are short printable ASCII without spaces.
fn is_sane(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN && id.bytes().all(|b| b.is_ascii_graphic())
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| is_sane(id))
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = CURRENT_REQUEST_ID
        .scope(request_id.clone(), next.run(request))
        .await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_id_follows_spawned_work() {
        assert_eq!(current_request_id(), None);

        let seen = CURRENT_REQUEST_ID
            .scope("req-1".to_string(), async {
                tokio::spawn(carry_request_id(async { current_request_id() }))
                    .await
                    .ok()
                    .flatten()
            })
            .await;

        assert_eq!(seen.as_deref(), Some("req-1"));
    }

    #[test]
    fn test_sane_ids() {
        assert!(is_sane("abc-123"));
        assert!(is_sane(&Uuid::new_v4().to_string()));
        assert!(!is_sane(""));
        assert!(!is_sane("has space"));
        assert!(!is_sane(&"x".repeat(65)));
    }
}
