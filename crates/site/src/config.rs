//! Site configuration loaded from environment variables.
//!
//! Every variable is optional; defaults reproduce the public demo setup.
//!
//! # Environment Variables
//!
//! ## Server
//! - `LEKAS_HOST` - Bind address (default: 127.0.0.1)
//! - `LEKAS_PORT` - Listen port (default: 3000)
//! - `LEKAS_BASE_URL` - Public URL used in canonical and Open Graph tags
//!   (default: <https://lekas.com>)
//! - `LEKAS_ENVIRONMENT` - `development` or `production` (default: development)
//! - `LEKAS_LOG_FORMAT` - `pretty` or `json` (default: pretty)
//!
//! ## REST API
//! - `LEKAS_API_BASE_URL` - API root (default: <https://jsonplaceholder.typicode.com>)
//! - `LEKAS_API_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `LEKAS_API_TOKEN` - Bearer token seeded into the credential store
//! - `LEKAS_CREDENTIALS_PATH` - Persist the token in this JSON file
//!
//! ## Query cache
//! - `LEKAS_CACHE_STALE_SECS` - Default staleness window (default: 300)
//! - `LEKAS_CACHE_GC_SECS` - Idle eviction window (default: 600)
//! - `LEKAS_CACHE_MAX_ENTRIES` - Cache capacity (default: 1000)
//! - `LEKAS_QUERY_RETRIES` - Retries for failed reads (default: 3)
//! - `LEKAS_QUERY_RETRY_BASE_MS` / `LEKAS_QUERY_RETRY_MAX_MS` - Backoff
//!   bounds (default: 1000 / 30000)
//!
//! ## Features
//! - `LEKAS_ENABLE_ANALYTICS`, `LEKAS_ENABLE_DEV_TOOLS`, `LEKAS_ENABLE_PWA`,
//!   `LEKAS_ENABLE_SERVICE_WORKER`, `LEKAS_ENABLE_OFFLINE_MODE`,
//!   `LEKAS_ENABLE_NOTIFICATIONS`, `LEKAS_ENABLE_CHAT`, `LEKAS_ENABLE_A11Y`
//! - `GA4_MEASUREMENT_ID`, `FB_PIXEL_ID`, `HOTJAR_ID` - Analytics providers
//!
//! ## Build metadata
//! - `APP_VERSION`, `GIT_COMMIT`, `GIT_BRANCH`
//!
//! ## Error tracking
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
const DEFAULT_SITE_URL: &str = "https://lekas.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("expected development or production, got {other}")),
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected pretty or json, got {other}")),
        }
    }
}

/// Site configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public URL of the site, used for canonical and social URLs
    pub base_url: Url,
    pub environment: Environment,
    pub log_format: LogFormat,
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub features: FeatureFlags,
    pub analytics: AnalyticsConfig,
    pub build: BuildInfo,
    pub locale: LocaleConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// REST API client configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout: Duration,
    /// Token to seed the credential store with at startup
    pub token: Option<SecretString>,
    /// File backing the credential store; memory-only when unset
    pub credentials_path: Option<PathBuf>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("credentials_path", &self.credentials_path)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_url(DEFAULT_API_BASE_URL),
            timeout: Duration::from_secs(30),
            token: None,
            credentials_path: None,
        }
    }
}

/// Query cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a fetched value counts as fresh
    pub stale_time: Duration,
    /// How long an unread entry survives before eviction
    pub gc_time: Duration,
    pub max_entries: u64,
    /// Retries after the first failed read
    pub retries: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            gc_time: Duration::from_secs(10 * 60),
            max_entries: 1000,
            retries: 3,
            retry_base_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(30),
        }
    }
}

/// Feature toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct FeatureFlags {
    pub analytics: bool,
    /// Demo pages and the deliberate error route
    pub dev_tools: bool,
    pub pwa: bool,
    pub service_worker: bool,
    pub offline_mode: bool,
    pub notifications: bool,
    pub chat: bool,
    pub a11y: bool,
}

impl FeatureFlags {
    fn defaults_for(environment: Environment) -> Self {
        Self {
            analytics: false,
            dev_tools: false,
            pwa: true,
            service_worker: !environment.is_development(),
            offline_mode: true,
            notifications: true,
            chat: false,
            a11y: true,
        }
    }

    /// Flag names and values, in display order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("analytics", self.analytics),
            ("devTools", self.dev_tools),
            ("pwa", self.pwa),
            ("serviceWorker", self.service_worker),
            ("offlineMode", self.offline_mode),
            ("notifications", self.notifications),
            ("chat", self.chat),
            ("a11y", self.a11y),
        ]
    }
}

/// Analytics provider IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsConfig {
    /// Google Analytics 4 measurement ID
    pub ga4_measurement_id: Option<String>,
    /// Facebook pixel ID
    pub facebook_pixel_id: Option<String>,
    /// Hotjar site ID
    pub hotjar_id: Option<String>,
}

impl AnalyticsConfig {
    /// Whether any provider is configured.
    #[must_use]
    pub const fn has_provider(&self) -> bool {
        self.ga4_measurement_id.is_some()
            || self.facebook_pixel_id.is_some()
            || self.hotjar_id.is_some()
    }
}

/// Version information shown on the configuration demo page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub commit: String,
    pub branch: String,
    /// Process start time
    pub started_at: DateTime<Utc>,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            commit: "unknown".to_string(),
            branch: "main".to_string(),
            started_at: Utc::now(),
        }
    }
}

/// Language and locale settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleConfig {
    pub default_language: String,
    pub supported_languages: Vec<String>,
    pub locale: String,
    pub time_zone: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            supported_languages: vec!["en".to_string(), "es".to_string(), "fr".to_string()],
            locale: "en-US".to_string(),
            time_zone: "America/New_York".to_string(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable cannot be parsed or the values
    /// contradict each other.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`SiteConfig::from_env`].
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let environment = vars.parse_or("LEKAS_ENVIRONMENT", Environment::Development)?;

        let api = ApiConfig {
            base_url: vars.url_or("LEKAS_API_BASE_URL", DEFAULT_API_BASE_URL)?,
            timeout: Duration::from_secs(vars.parse_or("LEKAS_API_TIMEOUT_SECS", 30)?),
            token: vars.optional("LEKAS_API_TOKEN").map(SecretString::from),
            credentials_path: vars.optional("LEKAS_CREDENTIALS_PATH").map(PathBuf::from),
        };

        let cache = CacheConfig {
            stale_time: Duration::from_secs(vars.parse_or("LEKAS_CACHE_STALE_SECS", 300)?),
            gc_time: Duration::from_secs(vars.parse_or("LEKAS_CACHE_GC_SECS", 600)?),
            max_entries: vars.parse_or("LEKAS_CACHE_MAX_ENTRIES", 1000)?,
            retries: vars.parse_or("LEKAS_QUERY_RETRIES", 3)?,
            retry_base_delay: Duration::from_millis(
                vars.parse_or("LEKAS_QUERY_RETRY_BASE_MS", 1000)?,
            ),
            retry_max_delay: Duration::from_millis(
                vars.parse_or("LEKAS_QUERY_RETRY_MAX_MS", 30_000)?,
            ),
        };

        let defaults = FeatureFlags::defaults_for(environment);
        let features = FeatureFlags {
            analytics: vars.flag_or("LEKAS_ENABLE_ANALYTICS", defaults.analytics)?,
            dev_tools: vars.flag_or("LEKAS_ENABLE_DEV_TOOLS", defaults.dev_tools)?,
            pwa: vars.flag_or("LEKAS_ENABLE_PWA", defaults.pwa)?,
            service_worker: vars
                .flag_or("LEKAS_ENABLE_SERVICE_WORKER", defaults.service_worker)?,
            offline_mode: vars.flag_or("LEKAS_ENABLE_OFFLINE_MODE", defaults.offline_mode)?,
            notifications: vars.flag_or("LEKAS_ENABLE_NOTIFICATIONS", defaults.notifications)?,
            chat: vars.flag_or("LEKAS_ENABLE_CHAT", defaults.chat)?,
            a11y: vars.flag_or("LEKAS_ENABLE_A11Y", defaults.a11y)?,
        };

        let analytics = AnalyticsConfig {
            ga4_measurement_id: vars.optional("GA4_MEASUREMENT_ID"),
            facebook_pixel_id: vars.optional("FB_PIXEL_ID"),
            hotjar_id: vars.optional("HOTJAR_ID"),
        };

        let build = BuildInfo {
            version: vars.or("APP_VERSION", "1.0.0"),
            commit: vars.or("GIT_COMMIT", "unknown"),
            branch: vars.or("GIT_BRANCH", "main"),
            started_at: Utc::now(),
        };

        let config = Self {
            host: vars.parse_or("LEKAS_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: vars.parse_or("LEKAS_PORT", 3000)?,
            base_url: vars.url_or("LEKAS_BASE_URL", DEFAULT_SITE_URL)?,
            environment,
            log_format: vars.parse_or("LEKAS_LOG_FORMAT", LogFormat::Pretty)?,
            api,
            cache,
            features,
            analytics,
            build,
            locale: LocaleConfig::default(),
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: vars.parse_or("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: vars.parse_or("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "LEKAS_API_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        if self.cache.gc_time < self.cache.stale_time {
            return Err(ConfigError::Inconsistent(format!(
                "cache GC window ({}s) is shorter than the staleness window ({}s)",
                self.cache.gc_time.as_secs(),
                self.cache.stale_time.as_secs()
            )));
        }
        if self.cache.retry_max_delay < self.cache.retry_base_delay {
            return Err(ConfigError::Inconsistent(
                "maximum retry delay is shorter than the base delay".to_string(),
            ));
        }
        for (key, rate) in [
            ("SENTRY_SAMPLE_RATE", self.sentry_sample_rate),
            ("SENTRY_TRACES_SAMPLE_RATE", self.sentry_traces_sample_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::InvalidEnvVar(
                    key.to_string(),
                    format!("{rate} is outside 0.0..=1.0"),
                ));
            }
        }
        Ok(())
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether analytics scripts should be rendered.
    #[must_use]
    pub const fn analytics_enabled(&self) -> bool {
        self.features.analytics && self.analytics.has_provider()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Typed access to a variable lookup.
struct Vars<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Get a variable with a default value.
    fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Parse a boolean flag.
    fn flag_or(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        self.optional(key).map_or(Ok(default), |raw| {
            parse_flag(&raw).ok_or_else(|| {
                ConfigError::InvalidEnvVar(key.to_string(), format!("not a boolean: {raw}"))
            })
        })
    }

    /// Parse an http(s) URL.
    fn url_or(&self, key: &str, default: &str) -> Result<Url, ConfigError> {
        let raw = self.or(key, default);
        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("unsupported scheme {}", url.scheme()),
            ));
        }
        Ok(url)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_url(raw: &str) -> Url {
    Url::parse(raw).expect("built-in URL is valid")
}
