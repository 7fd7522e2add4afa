//! Lekas Core - Shared domain types.
//!
//! This crate provides the records exchanged with the Lekas REST API:
//! users, posts and contact submissions, plus the query parameters used to
//! page and filter list endpoints.
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O and no HTTP
//! clients. The `lekas-site` crate owns the API client and the query cache.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, validated emails, statuses and API records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
