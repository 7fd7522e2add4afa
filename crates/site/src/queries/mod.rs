//! Domain reads and writes through the query cache.
//!
//! Each type pairs an API service with the shared [`QueryClient`] and knows
//! which keys its data lives under, how long it stays fresh, and what to
//! invalidate after a mutation.
//!
//! Mutations invalidate the affected collection first and then write the
//! changed record, so the record written last is the one that stays fresh.
//!
//! [`QueryClient`]: crate::query::QueryClient

mod contact;
mod posts;
mod users;

pub use contact::ContactQueries;
pub use posts::PostQueries;
pub use users::UserQueries;
