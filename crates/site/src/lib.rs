//! Lekas marketing site library.
//!
//! Server-rendered pages for the Lekas website plus the plumbing behind
//! them: a REST API client with bearer-token handling, a query cache with
//! de-duplicated fetches and mutation-driven invalidation, and an error
//! boundary around page rendering.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod boundary;
pub mod config;
pub mod error;
pub mod layout;
pub mod middleware;
pub mod nav;
pub mod queries;
pub mod query;
pub mod routes;
pub mod seo;
pub mod state;
