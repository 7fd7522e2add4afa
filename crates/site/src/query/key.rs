//! Hierarchical cache keys.
//!
//! A key is a path of segments rooted at `"api"`. Invalidating a key also
//! affects every key below it, so `["api","posts"]` covers post details,
//! filtered lists and per-user lists alike.

use std::fmt;

use lekas_core::{ContactId, PostId, QueryParams, UserId};

/// One step of a [`QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySegment {
    /// Fixed name such as `users` or `profile`
    Static(&'static str),
    /// Record ID
    Id(u64),
    /// Canonical JSON of list parameters
    Params(String),
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(name) => write!(f, "\"{name}\""),
            Self::Id(id) => write!(f, "\"{id}\""),
            Self::Params(json) => f.write_str(json),
        }
    }
}

/// Address of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    fn root() -> Self {
        Self(vec![KeySegment::Static("api")])
    }

    fn push(mut self, segment: KeySegment) -> Self {
        self.0.push(segment);
        self
    }

    fn with(self, name: &'static str) -> Self {
        self.push(KeySegment::Static(name))
    }

    fn with_id(self, id: impl Into<u64>) -> Self {
        self.push(KeySegment::Id(id.into()))
    }

    fn with_params(self, params: &QueryParams) -> Self {
        // Serializing a plain struct of options cannot fail.
        let json = serde_json::to_string(params).unwrap_or_default();
        self.push(KeySegment::Params(json))
    }

    #[must_use]
    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    /// Whether `prefix` is this key or one of its ancestors.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{segment}")?;
        }
        f.write_str("]")
    }
}

/// Key factory. Every cache key in the site comes from here.
pub mod keys {
    use super::{ContactId, PostId, QueryKey, QueryParams, UserId};

    /// `["api"]`
    #[must_use]
    pub fn all() -> QueryKey {
        QueryKey::root()
    }

    /// `["api","users"]`
    #[must_use]
    pub fn users() -> QueryKey {
        all().with("users")
    }

    /// `["api","users"]` unfiltered, `["api","users",{params}]` otherwise.
    #[must_use]
    pub fn users_list(params: &QueryParams) -> QueryKey {
        if params.is_empty() {
            users()
        } else {
            users().with_params(params)
        }
    }

    /// `["api","users","<id>"]`
    #[must_use]
    pub fn user(id: UserId) -> QueryKey {
        users().with_id(id)
    }

    /// `["api","users","profile"]`
    #[must_use]
    pub fn user_profile() -> QueryKey {
        users().with("profile")
    }

    /// `["api","posts"]`
    #[must_use]
    pub fn posts() -> QueryKey {
        all().with("posts")
    }

    /// `["api","posts"]` unfiltered, `["api","posts",{params}]` otherwise.
    #[must_use]
    pub fn posts_list(params: &QueryParams) -> QueryKey {
        if params.is_empty() {
            posts()
        } else {
            posts().with_params(params)
        }
    }

    /// `["api","posts","<id>"]`
    #[must_use]
    pub fn post(id: PostId) -> QueryKey {
        posts().with_id(id)
    }

    /// `["api","posts","user","<id>"]`
    #[must_use]
    pub fn posts_by_user(user_id: UserId) -> QueryKey {
        posts().with("user").with_id(user_id)
    }

    /// `["api","services"]`
    #[must_use]
    pub fn services() -> QueryKey {
        all().with("services")
    }

    /// `["api","services","<id>"]`
    #[must_use]
    pub fn service(id: u64) -> QueryKey {
        services().with_id(id)
    }

    /// `["api","contact"]`
    #[must_use]
    pub fn contact() -> QueryKey {
        all().with("contact")
    }

    /// `["api","contact","form"]`
    #[must_use]
    pub fn contact_form() -> QueryKey {
        contact().with("form")
    }

    /// `["api","contact","<id>"]`
    #[must_use]
    pub fn contact_submission(id: ContactId) -> QueryKey {
        contact().with_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::keys;
    use super::*;

    #[test]
    fn test_display_matches_key_paths() {
        assert_eq!(keys::all().to_string(), r#"["api"]"#);
        assert_eq!(keys::post(PostId::new(101)).to_string(), r#"["api","posts","101"]"#);
        assert_eq!(
            keys::posts_by_user(UserId::new(3)).to_string(),
            r#"["api","posts","user","3"]"#
        );
        assert_eq!(
            keys::users_list(&QueryParams::limit(5)).to_string(),
            r#"["api","users",{"limit":5}]"#
        );
    }

    #[test]
    fn test_unfiltered_list_uses_collection_key() {
        assert_eq!(keys::posts_list(&QueryParams::default()), keys::posts());
        assert_ne!(keys::posts_list(&QueryParams::limit(3)), keys::posts());
    }

    #[test]
    fn test_prefix_matching() {
        let detail = keys::user(UserId::new(42));
        assert!(detail.starts_with(&keys::users()));
        assert!(detail.starts_with(&keys::all()));
        assert!(detail.starts_with(&detail));
        assert!(!detail.starts_with(&keys::posts()));
        assert!(!keys::users().starts_with(&detail));
    }

    #[test]
    fn test_same_params_same_key() {
        let a = keys::posts_list(&QueryParams::limit(3));
        let b = keys::posts_list(&QueryParams::limit(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_ids_are_not_confused_with_names() {
        assert_ne!(keys::user_profile(), keys::user(UserId::new(0)));
        assert_ne!(keys::contact_form(), keys::contact_submission(ContactId::new(1)));
    }
}
