//! Domain types for the Lekas REST API.
//!
//! Field names follow the API's camelCase JSON; Rust code uses snake case.

pub mod contact;
pub mod email;
pub mod id;
pub mod post;
pub mod query;
pub mod status;
pub mod user;

pub use contact::{ContactForm, ContactSubmission};
pub use email::{Email, EmailError};
pub use id::*;
pub use post::{CreatePostRequest, Post, UpdatePostRequest};
pub use query::{QueryParams, SortOrder};
pub use status::ContactStatus;
pub use user::{Address, Company, CreateUserRequest, Geo, UpdateUserRequest, User};

/// A request body failed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{0} is required")]
    Required(&'static str),

    /// The email field is not a usable address.
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),
}

/// Fail with [`ValidationError::Required`] when `value` is blank.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}
