//! HTTP client for the Lekas REST API.
//!
//! Every call goes through [`ApiClient::request`], which attaches the bearer
//! token and JSON headers plus the ID of the page request it serves (or a
//! fresh one outside a page request), logs the exchange, and turns
//! failures into [`ApiError`]. A 401 additionally clears the stored token
//! and sends the visitor to [`LOGIN_PATH`].

use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};
use url::Url;
use uuid::Uuid;

use super::credentials::CredentialStore;
use super::error::{ApiError, ApiResult};
use crate::config::ApiConfig;
use crate::middleware::request_id::{REQUEST_ID_HEADER, current_request_id};

/// Route visitors are sent to when the API rejects their credentials.
pub const LOGIN_PATH: &str = "/login";

/// Receives forced navigations, such as the redirect to login after a 401.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, path: &str) {
        self(path);
    }
}

/// Client for the REST API.
///
/// Cheap to clone; all clones share one connection pool and credential
/// store.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Create a client for `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        config: &ApiConfig,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(concat!("lekas-site/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Other {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.clone(),
                credentials,
                navigator,
            }),
        })
    }

    /// The configured API root.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The credential store consulted on every request.
    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.credentials
    }

    /// Resolve an API path such as `/users/1?_limit=5` against the base URL.
    ///
    /// The base URL's own path is kept, so `https://host/v1` + `/users`
    /// gives `https://host/v1/users`.
    fn url(&self, path: &str) -> ApiResult<Url> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // =========================================================================
    // Verbs
    // =========================================================================

    /// GET `path` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    /// POST `body` as JSON to `path`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// PUT `body` as JSON to `path`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// PATCH `body` as JSON to `path`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    /// DELETE `path`, ignoring any response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.request::<serde_json::Value, ()>(Method::DELETE, path, None)
            .await
            .map(drop)
    }

    /// Send one request and decode the response.
    ///
    /// An empty success body decodes as JSON `null`, so `T` may be `()` or an
    /// `Option`.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Server`] for non-2xx responses
    /// - [`ApiError::Network`] when no response arrives
    /// - [`ApiError::Other`] for bad URLs and undecodable bodies
    #[instrument(skip(self, body), fields(request_id))]
    pub async fn request<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let url = self.url(path)?;
        let request_id = current_request_id().unwrap_or_else(|| Uuid::new_v4().to_string());
        tracing::Span::current().record("request_id", request_id.as_str());

        let mut builder = self
            .inner
            .http
            .request(method.clone(), url.clone())
            .header(REQUEST_ID_HEADER, &request_id);

        if let Some(token) = self.inner.credentials.token() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        debug!(%method, %url, "API request");
        let started = Instant::now();

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = ApiError::from(e);
                error!(%method, %url, error = %err, "API request failed without a response");
                return Err(err);
            }
        };

        let status = response.status();
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(%method, %url, status = status.as_u16(), elapsed_ms, "API response");

        if !status.is_success() {
            // The status arrived; a body that fails to read only loses the
            // message, never the 401 side effects.
            let text = response.text().await.unwrap_or_else(|e| {
                debug!(%url, error = %e, "Failed to read error response body");
                String::new()
            });
            let err = ApiError::from_response(status, &text);
            self.on_error_status(status, &err);
            return Err(err);
        }

        let text = response.text().await.map_err(ApiError::from)?;
        let text = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str(text).map_err(|e| {
            error!(%url, error = %e, "Failed to decode API response");
            ApiError::from(e)
        })
    }

    /// Log a non-2xx answer and apply the 401 side effects.
    fn on_error_status(&self, status: StatusCode, err: &ApiError) {
        match status {
            StatusCode::UNAUTHORIZED => {
                warn!(detail = err.message(), "Unauthorized; clearing stored credentials");
                self.inner.credentials.clear();
                self.inner.navigator.navigate(LOGIN_PATH);
            }
            StatusCode::FORBIDDEN => warn!(detail = err.message(), "Access forbidden"),
            StatusCode::NOT_FOUND => debug!(detail = err.message(), "Resource not found"),
            StatusCode::INTERNAL_SERVER_ERROR => {
                error!(detail = err.message(), "Server error");
            }
            _ => warn!(status = status.as_u16(), detail = err.message(), "HTTP error"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::credentials::MemoryCredentialStore;

    fn client(base: &str) -> ApiClient {
        let config = ApiConfig {
            base_url: Url::parse(base).unwrap(),
            ..ApiConfig::default()
        };
        ApiClient::new(
            &config,
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(|_: &str| {}),
        )
        .unwrap()
    }

    #[test]
    fn test_url_joins_paths() {
        let api = client("https://jsonplaceholder.typicode.com");
        assert_eq!(
            api.url("/users/1").unwrap().as_str(),
            "https://jsonplaceholder.typicode.com/users/1"
        );
        assert_eq!(
            api.url("posts?_limit=5").unwrap().as_str(),
            "https://jsonplaceholder.typicode.com/posts?_limit=5"
        );
    }

    #[test]
    fn test_url_keeps_base_path() {
        let api = client("https://api.lekas.com/v1/");
        assert_eq!(
            api.url("/contact").unwrap().as_str(),
            "https://api.lekas.com/v1/contact"
        );
    }

    #[tokio::test]
    async fn test_unauthorized_with_truncated_body_still_logs_out() {
        use std::sync::Mutex;

        use secrecy::SecretString;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Promise a 100 byte body, send 5 bytes, hang up.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0_u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 401 Unauthorized\r\nContent-Length: 100\r\n\r\n{\"mes")
                .await
                .unwrap();
        });

        let credentials = Arc::new(MemoryCredentialStore::with_token(SecretString::from(
            "stale-token",
        )));
        let navigations = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&navigations);
        let config = ApiConfig {
            base_url: Url::parse(&format!("http://{addr}")).unwrap(),
            ..ApiConfig::default()
        };
        let api = ApiClient::new(
            &config,
            credentials.clone(),
            Arc::new(move |path: &str| recorded.lock().unwrap().push(path.to_string())),
        )
        .unwrap();

        let err = api.get::<serde_json::Value>("/users/me").await.unwrap_err();

        assert_eq!(err.status(), 401);
        assert!(err.is_unauthorized());
        assert!(credentials.token().is_none());
        assert_eq!(*navigations.lock().unwrap(), vec![LOGIN_PATH.to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let api = client("http://127.0.0.1:9");
        let err = api.get::<serde_json::Value>("/users").await.unwrap_err();
        assert!(matches!(err, ApiError::Network { .. }));
        assert_eq!(err.status(), 0);
    }
}
