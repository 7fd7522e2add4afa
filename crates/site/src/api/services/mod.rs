//! Typed wrappers mapping REST endpoints to functions.
//!
//! Services hold no state beyond the shared [`ApiClient`](super::ApiClient)
//! and do nothing but assemble paths and bodies.

mod contact;
mod posts;
mod users;

pub use contact::ContactService;
pub use posts::PostService;
pub use users::UserService;

/// Append form-encoded `pairs` to `path`, or return `path` unchanged when
/// there are none.
#[must_use]
pub fn with_query<K, V>(path: &str, pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if pairs.is_empty() {
        return path.to_string();
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
        .finish();
    format!("{path}?{query}")
}
