//! Normalized API failures.

use reqwest::StatusCode;
use thiserror::Error;

/// Message used whenever a request got no response at all.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

/// A failed API call.
///
/// Every variant exposes the same normalized shape through
/// [`ApiError::status`], [`ApiError::message`] and [`ApiError::data`]; the
/// status is `0` when no response was received. The type is `Clone` so one
/// failure can be handed to every caller waiting on a shared fetch.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Server {
        status: u16,
        message: String,
        /// Response body, when it was JSON
        data: Option<serde_json::Value>,
    },

    /// No response arrived (connection refused, DNS failure, timeout).
    #[error("{message}")]
    Network { message: String },

    /// Anything else: bad URL, undecodable body, request building.
    #[error("{message}")]
    Other { message: String },
}

impl ApiError {
    /// Build a server error from a status and raw response body.
    ///
    /// The message is the body's `message` field when present, otherwise the
    /// canonical reason phrase.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let data = serde_json::from_str::<serde_json::Value>(body).ok();
        let message = data
            .as_ref()
            .and_then(|d| d.get("message"))
            .and_then(serde_json::Value::as_str)
            .map_or_else(
                || {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                },
                str::to_string,
            );

        Self::Server {
            status: status.as_u16(),
            message,
            data,
        }
    }

    /// HTTP status, or `0` when no response was received.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Server { status, .. } => *status,
            Self::Network { .. } | Self::Other { .. } => 0,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Server { message, .. }
            | Self::Network { message }
            | Self::Other { message } => message,
        }
    }

    #[must_use]
    pub const fn data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Server { data, .. } => data.as_ref(),
            Self::Network { .. } | Self::Other { .. } => None,
        }
    }

    /// A 4xx answer; retrying the same request cannot help.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Server { status, .. } if *status >= 400 && *status < 500)
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Server { status: 401, .. })
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Server { status: 404, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::Network {
                message: NETWORK_ERROR_MESSAGE.to_string(),
            }
        } else {
            Self::Other {
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other {
            message: format!("invalid response body: {err}"),
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        Self::Other {
            message: format!("invalid request URL: {err}"),
        }
    }
}

/// Result type alias for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_prefers_body_message() {
        let err = ApiError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message": "email already taken", "field": "email"}"#,
        );
        assert_eq!(err.status(), 422);
        assert_eq!(err.message(), "email already taken");
        assert_eq!(
            err.data().and_then(|d| d.get("field")),
            Some(&serde_json::json!("email"))
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_server_error_falls_back_to_reason() {
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(err.message(), "Internal Server Error");
        assert!(err.data().is_none());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_status_zero_without_response() {
        let err = ApiError::Network {
            message: NETWORK_ERROR_MESSAGE.to_string(),
        };
        assert_eq!(err.status(), 0);
        assert_eq!(err.to_string(), NETWORK_ERROR_MESSAGE);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_status_predicates() {
        assert!(ApiError::from_response(StatusCode::UNAUTHORIZED, "").is_unauthorized());
        assert!(ApiError::from_response(StatusCode::NOT_FOUND, "{}").is_not_found());
        assert!(!ApiError::from_response(StatusCode::BAD_GATEWAY, "").is_client_error());
    }
}
