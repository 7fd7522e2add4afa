//! Cached value types.

use lekas_core::{ContactSubmission, Post, User};

/// Everything the query cache can hold.
#[derive(Debug, Clone)]
pub enum CacheValue {
    User(Box<User>),
    Users(Vec<User>),
    Post(Box<Post>),
    Posts(Vec<Post>),
    Contact(Box<ContactSubmission>),
    Contacts(Vec<ContactSubmission>),
}

impl CacheValue {
    /// Variant name, for logs and type-mismatch errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Users(_) => "users",
            Self::Post(_) => "post",
            Self::Posts(_) => "posts",
            Self::Contact(_) => "contact",
            Self::Contacts(_) => "contacts",
        }
    }
}

/// A type that can be stored in the query cache.
pub trait Cacheable: Clone + Send + Sync + 'static {
    fn into_value(self) -> CacheValue;

    /// The typed value, if `value` holds this type.
    fn from_value(value: &CacheValue) -> Option<Self>;
}

macro_rules! cacheable_boxed {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn into_value(self) -> CacheValue {
                CacheValue::$variant(Box::new(self))
            }

            fn from_value(value: &CacheValue) -> Option<Self> {
                match value {
                    CacheValue::$variant(inner) => Some((**inner).clone()),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! cacheable_list {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for Vec<$ty> {
            fn into_value(self) -> CacheValue {
                CacheValue::$variant(self)
            }

            fn from_value(value: &CacheValue) -> Option<Self> {
                match value {
                    CacheValue::$variant(items) => Some(items.clone()),
                    _ => None,
                }
            }
        }
    };
}

cacheable_boxed!(User, User);
cacheable_boxed!(Post, Post);
cacheable_boxed!(ContactSubmission, Contact);
cacheable_list!(User, Users);
cacheable_list!(Post, Posts);
cacheable_list!(ContactSubmission, Contacts);
