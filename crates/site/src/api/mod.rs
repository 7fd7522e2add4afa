//! REST API access: HTTP client, credential storage and typed services.
//!
//! # Example
//!
//! ```rust,ignore
//! use lekas_site::api::{ApiClient, UserService};
//!
//! let users = UserService::new(api.clone());
//! let user = users.get(UserId::new(1)).await?;
//! ```

pub mod client;
pub mod credentials;
pub mod error;
pub mod services;

pub use client::{ApiClient, LOGIN_PATH, Navigator};
pub use credentials::{AUTH_TOKEN_KEY, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{ApiError, ApiResult, NETWORK_ERROR_MESSAGE};
pub use services::{ContactService, PostService, UserService};
