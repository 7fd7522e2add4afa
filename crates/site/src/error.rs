//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before responding. The response carries an
//! [`ErrorPage`] extension that the error-page middleware turns into the
//! full HTML page, since rendering the layout needs application state.

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::api::{ApiError, LOGIN_PATH};
use crate::boundary::CaughtError;
use crate::query::QueryError;

/// Application-level error type for the site.
#[derive(Debug, Error)]
pub enum AppError {
    /// REST API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Page rendering failed inside an error boundary.
    #[error("Render error: {0}")]
    Render(CaughtError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Api(api) => Self::Api(api),
            other @ QueryError::TypeMismatch { .. } => Self::Internal(other.to_string()),
        }
    }
}

// Malformed URLs get the site's error page rather than axum's plain text.

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Which page to show for a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPageKind {
    NotFound,
    Failed,
}

/// Marker left on error responses for the error-page middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    pub kind: ErrorPageKind,
    /// Technical detail, shown only in development
    pub detail: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Api(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Render(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Api(err) = &self
            && err.is_unauthorized()
        {
            tracing::info!("API rejected credentials, redirecting to login");
            return Redirect::to(LOGIN_PATH).into_response();
        }

        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let kind = if status == StatusCode::NOT_FOUND {
            ErrorPageKind::NotFound
        } else {
            ErrorPageKind::Failed
        };

        // Plain body in case the middleware is not installed
        let body = match kind {
            ErrorPageKind::NotFound => "Page not found",
            ErrorPageKind::Failed => "Something went wrong",
        };

        let mut response = (status, body).into_response();
        response.extensions_mut().insert(ErrorPage {
            kind,
            detail: self.to_string(),
        });
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use axum::http::header::LOCATION;

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("/users/99".to_string());
        assert_eq!(err.to_string(), "Not found: /users/99");

        let err = AppError::BadRequest("email: invalid".to_string());
        assert_eq!(err.to_string(), "Bad request: email: invalid");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(ApiError::from_response(StatusCode::NOT_FOUND, "").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ApiError::from_response(StatusCode::SERVICE_UNAVAILABLE, "").into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_unauthorized_redirects_to_login() {
        let response =
            AppError::from(ApiError::from_response(StatusCode::UNAUTHORIZED, "")).into_response();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[LOCATION], LOGIN_PATH);
        assert!(response.extensions().get::<ErrorPage>().is_none());
    }

    #[test]
    fn test_marker_is_attached() {
        let response = AppError::NotFound("x".to_string()).into_response();
        let marker = response.extensions().get::<ErrorPage>().cloned();
        assert_eq!(
            marker.map(|m| m.kind),
            Some(ErrorPageKind::NotFound)
        );
    }

    #[test]
    fn test_query_type_mismatch_is_internal() {
        let err = AppError::from(QueryError::TypeMismatch {
            key: "[\"api\"]".to_string(),
            found: "users",
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
