//! The query cache.
//!
//! [`QueryClient`] sits between page handlers and the API services. Reads go
//! through [`QueryClient::fetch_query`]:
//!
//! - a fresh entry is returned without touching the network;
//! - a stale entry is returned immediately while a background fetch
//!   refreshes it;
//! - a missing entry is fetched, and every concurrent reader of the same
//!   key waits on that one fetch.
//!
//! Mutations run through [`QueryClient::mutate`] and then adjust the cache
//! with [`QueryClient::set_query_data`], [`QueryClient::invalidate_queries`]
//! and [`QueryClient::remove_queries`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt, Shared};
use moka::future::Cache;
use moka::ops::compute::Op;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::key::QueryKey;
use super::retry::RetryPolicy;
use super::value::{CacheValue, Cacheable};
use crate::api::{ApiError, ApiResult};
use crate::config::CacheConfig;
use crate::middleware::request_id::carry_request_id;

/// Errors returned by cached reads and mutations.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// The API call failed (after any retries).
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The entry under this key holds a different type than requested.
    #[error("cache entry {key} holds {found}, not the requested type")]
    TypeMismatch { key: String, found: &'static str },
}

impl QueryError {
    /// The underlying API error, if any.
    #[must_use]
    pub const fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            Self::TypeMismatch { .. } => None,
        }
    }
}

/// Tuning for a [`QueryClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Default staleness window
    pub stale_time: Duration,
    /// Entries unread for this long are evicted
    pub gc_time: Duration,
    pub max_entries: u64,
    pub retry: RetryPolicy,
    pub mutation_retry: RetryPolicy,
}

impl QueryOptions {
    #[must_use]
    pub const fn from_config(config: &CacheConfig) -> Self {
        Self {
            stale_time: config.stale_time,
            gc_time: config.gc_time,
            max_entries: config.max_entries,
            retry: RetryPolicy::from_config(config),
            mutation_retry: RetryPolicy::for_mutations(),
        }
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

/// Point-in-time view of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryState {
    /// When the cached value was written, if there is one
    pub updated_at: Option<Instant>,
    /// No value, an invalidated value, or one older than the default window
    pub is_stale: bool,
    pub is_fetching: bool,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CacheValue,
    updated_at: Instant,
    invalidated: bool,
}

impl CacheEntry {
    fn fresh(value: CacheValue) -> Self {
        Self {
            value,
            updated_at: Instant::now(),
            invalidated: false,
        }
    }

    fn is_stale(&self, stale_time: Duration) -> bool {
        self.invalidated || self.updated_at.elapsed() >= stale_time
    }
}

type SharedFetch = Shared<BoxFuture<'static, Result<CacheValue, QueryError>>>;

struct InFlight {
    id: u64,
    fetch: SharedFetch,
}

/// Process-wide query cache. Cheap to clone.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<QueryClientInner>,
}

struct QueryClientInner {
    entries: Cache<QueryKey, CacheEntry>,
    /// Outstanding fetches. Also serializes cache writes made by fetches
    /// with invalidation, so a detached fetch never writes.
    in_flight: Mutex<HashMap<QueryKey, InFlight>>,
    next_fetch_id: AtomicU64,
    options: QueryOptions,
}

impl QueryClient {
    #[must_use]
    pub fn new(options: QueryOptions) -> Self {
        let entries = Cache::builder()
            .max_capacity(options.max_entries)
            .time_to_idle(options.gc_time)
            .build();

        Self {
            inner: Arc::new(QueryClientInner {
                entries,
                in_flight: Mutex::new(HashMap::new()),
                next_fetch_id: AtomicU64::new(0),
                options,
            }),
        }
    }

    #[must_use]
    pub fn options(&self) -> &QueryOptions {
        &self.inner.options
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read `key` using the default staleness window.
    ///
    /// # Errors
    ///
    /// See [`QueryClient::fetch_query_with`].
    pub async fn fetch_query<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T, QueryError>
    where
        T: Cacheable,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        self.fetch_query_with(key, self.inner.options.stale_time, fetcher)
            .await
    }

    /// Read `key`, treating entries younger than `stale_time` as fresh.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when there was no cached value to fall back
    /// on, or [`QueryError::TypeMismatch`] if `key` holds another type.
    pub async fn fetch_query_with<T, F, Fut>(
        &self,
        key: QueryKey,
        stale_time: Duration,
        fetcher: F,
    ) -> Result<T, QueryError>
    where
        T: Cacheable,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        if let Some(entry) = self.inner.entries.get(&key).await {
            let value = T::from_value(&entry.value).ok_or_else(|| QueryError::TypeMismatch {
                key: key.to_string(),
                found: entry.value.kind(),
            })?;

            if entry.is_stale(stale_time) {
                debug!(%key, "Serving stale value, refetching in background");
                drop(self.start_fetch(key, fetcher, None).await);
            } else {
                debug!(%key, "Cache hit");
            }
            return Ok(value);
        }

        debug!(%key, "Cache miss");
        let value = self
            .start_fetch(key.clone(), fetcher, Some(stale_time))
            .await
            .await?;
        T::from_value(&value).ok_or_else(|| QueryError::TypeMismatch {
            key: key.to_string(),
            found: value.kind(),
        })
    }

    /// Join the in-flight fetch for `key`, or start one.
    ///
    /// With `fresh_within` set, an entry that became fresh since the caller
    /// last looked is served instead. [`QueryClient::finish_fetch`] writes
    /// under the same lock, so a fetch cannot complete unseen between the
    /// caller's miss and this check.
    ///
    /// The fetch runs on its own task, so it completes even if every waiter
    /// goes away.
    async fn start_fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        fetcher: F,
        fresh_within: Option<Duration>,
    ) -> SharedFetch
    where
        T: Cacheable,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let mut in_flight = self.inner.in_flight.lock().await;
        if let Some(existing) = in_flight.get(&key) {
            debug!(%key, "Joining in-flight fetch");
            return existing.fetch.clone();
        }
        if let Some(stale_time) = fresh_within
            && let Some(entry) = self.inner.entries.get(&key).await
            && !entry.is_stale(stale_time)
        {
            debug!(%key, "Fetch completed meanwhile; serving cached value");
            return future::ready(Ok(entry.value)).boxed().shared();
        }

        let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let client = self.clone();
        let fetch_key = key.clone();
        let fetch = async move {
            let result = client
                .inner
                .options
                .retry
                .run(&fetcher)
                .await
                .map(Cacheable::into_value)
                .map_err(QueryError::from);
            client.finish_fetch(&fetch_key, id, &result).await;
            result
        }
        .boxed()
        .shared();

        in_flight.insert(
            key,
            InFlight {
                id,
                fetch: fetch.clone(),
            },
        );
        tokio::spawn(carry_request_id(fetch.clone().map(drop)));
        fetch
    }

    /// Store a fetch result unless the fetch was detached meanwhile.
    async fn finish_fetch(&self, key: &QueryKey, id: u64, result: &Result<CacheValue, QueryError>) {
        let mut in_flight = self.inner.in_flight.lock().await;
        let current = in_flight.get(key).is_some_and(|f| f.id == id);
        if current {
            in_flight.remove(key);
        }

        match result {
            Ok(value) if current => {
                self.inner
                    .entries
                    .insert(key.clone(), CacheEntry::fresh(value.clone()))
                    .await;
            }
            Ok(_) => debug!(%key, "Discarding result of detached fetch"),
            Err(err) => warn!(%key, error = %err, "Query failed"),
        }
    }

    /// The cached value under `key`, fresh or not, without fetching.
    pub async fn get_query_data<T: Cacheable>(&self, key: &QueryKey) -> Option<T> {
        self.inner
            .entries
            .get(key)
            .await
            .and_then(|entry| T::from_value(&entry.value))
    }

    /// Whether a fetch for `key` is outstanding.
    pub async fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner.in_flight.lock().await.contains_key(key)
    }

    pub async fn query_state(&self, key: &QueryKey) -> QueryState {
        let entry = self.inner.entries.get(key).await;
        QueryState {
            updated_at: entry.as_ref().map(|e| e.updated_at),
            is_stale: entry
                .as_ref()
                .is_none_or(|e| e.is_stale(self.inner.options.stale_time)),
            is_fetching: self.is_fetching(key).await,
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Run a mutation under the mutation retry policy.
    ///
    /// # Errors
    ///
    /// Returns the API error once retrying stops.
    pub async fn mutate<T, F, Fut>(&self, mutation: F) -> Result<T, QueryError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        Ok(self.inner.options.mutation_retry.run(mutation).await?)
    }

    /// Overwrite `key` with a fresh value.
    pub async fn set_query_data<T: Cacheable>(&self, key: QueryKey, value: T) {
        debug!(%key, "Writing query data");
        self.inner
            .entries
            .insert(key, CacheEntry::fresh(value.into_value()))
            .await;
    }

    /// Mark every entry under `prefix` stale and detach fetches already in
    /// flight for it, since they may return pre-mutation data.
    pub async fn invalidate_queries(&self, prefix: &QueryKey) {
        let mut in_flight = self.inner.in_flight.lock().await;
        in_flight.retain(|key, _| !key.starts_with(prefix));

        let matching = self.matching_keys(prefix);
        debug!(%prefix, count = matching.len(), "Invalidating queries");
        for key in matching {
            // Flag whatever is stored now; a value written since the key
            // scan must survive.
            self.inner
                .entries
                .entry(key)
                .and_compute_with(|current| {
                    future::ready(current.map_or(Op::Nop, |entry| {
                        let mut entry = entry.into_value();
                        entry.invalidated = true;
                        Op::Put(entry)
                    }))
                })
                .await;
        }
    }

    /// Drop every entry under `prefix` and detach fetches for it.
    pub async fn remove_queries(&self, prefix: &QueryKey) {
        let mut in_flight = self.inner.in_flight.lock().await;
        in_flight.retain(|key, _| !key.starts_with(prefix));

        let matching = self.matching_keys(prefix);
        debug!(%prefix, count = matching.len(), "Removing queries");
        for key in matching {
            self.inner.entries.invalidate(&key).await;
        }
    }

    /// Detach in-flight fetches under `prefix`. Their waiters still get a
    /// result, but it is not written to the cache.
    pub async fn cancel_queries(&self, prefix: &QueryKey) {
        let mut in_flight = self.inner.in_flight.lock().await;
        in_flight.retain(|key, _| !key.starts_with(prefix));
    }

    /// Drop everything.
    pub async fn clear(&self) {
        self.inner.in_flight.lock().await.clear();
        self.inner.entries.invalidate_all();
    }

    fn matching_keys(&self, prefix: &QueryKey) -> Vec<QueryKey> {
        self.inner
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| (*key).clone())
            .collect()
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(QueryOptions::default())
    }
}
