//! Application state shared across handlers.

use std::sync::{Arc, Mutex};

use crate::api::{
    ApiClient, ApiError, ContactService, CredentialStore, FileCredentialStore,
    MemoryCredentialStore, Navigator, PostService, UserService,
};
use crate::boundary::ErrorBoundary;
use crate::config::SiteConfig;
use crate::queries::{ContactQueries, PostQueries, UserQueries};
use crate::query::{QueryClient, QueryOptions};
use crate::seo::SiteSeo;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the one API client and the one query
/// cache the whole process uses.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    api: ApiClient,
    query: QueryClient,
    users: UserQueries,
    posts: PostQueries,
    contact: ContactQueries,
    seo: SiteSeo,
    /// Boundary of the error test page, kept failed until the page is
    /// revisited
    error_test_boundary: Mutex<ErrorBoundary>,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// The credential store is file-backed when `LEKAS_CREDENTIALS_PATH` is
    /// set, in memory otherwise; a configured token seeds it either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built.
    pub fn new(config: SiteConfig) -> Result<Self, ApiError> {
        let credentials: Arc<dyn CredentialStore> = match &config.api.credentials_path {
            Some(path) => Arc::new(FileCredentialStore::new(path)),
            None => Arc::new(MemoryCredentialStore::new()),
        };
        if let Some(token) = &config.api.token {
            credentials.set_token(token.clone());
        }

        let navigator: Arc<dyn Navigator> = Arc::new(|path: &str| {
            tracing::info!(target_path = path, "API requested navigation");
        });

        Self::with_parts(config, credentials, navigator)
    }

    /// Build state around an explicit credential store and navigator.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built.
    pub fn with_parts(
        config: SiteConfig,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api, credentials, navigator)?;
        let query = QueryClient::new(QueryOptions::from_config(&config.cache));
        let seo = SiteSeo::lekas(&config.base_url);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                users: UserQueries::new(query.clone(), UserService::new(api.clone())),
                posts: PostQueries::new(query.clone(), PostService::new(api.clone())),
                contact: ContactQueries::new(query.clone(), ContactService::new(api.clone())),
                config,
                api,
                query,
                seo,
                error_test_boundary: Mutex::new(ErrorBoundary::new("error-test")),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// The process-wide query cache.
    #[must_use]
    pub fn query(&self) -> &QueryClient {
        &self.inner.query
    }

    #[must_use]
    pub fn users(&self) -> &UserQueries {
        &self.inner.users
    }

    #[must_use]
    pub fn posts(&self) -> &PostQueries {
        &self.inner.posts
    }

    #[must_use]
    pub fn contact(&self) -> &ContactQueries {
        &self.inner.contact
    }

    #[must_use]
    pub fn seo(&self) -> &SiteSeo {
        &self.inner.seo
    }

    #[must_use]
    pub fn error_test_boundary(&self) -> &Mutex<ErrorBoundary> {
        &self.inner.error_test_boundary
    }
}
