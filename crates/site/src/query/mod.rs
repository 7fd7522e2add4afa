//! Query cache: keys, cached values, retry policy and the client itself.

mod client;
mod key;
mod retry;
mod value;

pub use client::{QueryClient, QueryError, QueryOptions, QueryState};
pub use key::{KeySegment, QueryKey, keys};
pub use retry::RetryPolicy;
pub use value::{CacheValue, Cacheable};
