//! Newtype IDs for API records.
//!
//! The REST API numbers every record with a positive integer. Wrapping those
//! numbers keeps a post ID from being passed where a user ID is expected.

/// Macro to define a type-safe numeric ID.
///
/// Creates a newtype wrapper around `u64` with:
/// - `Serialize`/`Deserialize` as a bare number (`#[serde(transparent)]`)
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `new()` / `get()` accessors and `From` conversions
/// - `Display` and `FromStr`, so IDs round-trip through URL path segments
///
/// # Example
///
/// ```rust
/// # use lekas_core::define_id;
/// define_id!(CommentId);
///
/// let id: CommentId = "7".parse().unwrap();
/// assert_eq!(id.get(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw numeric ID.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// The raw numeric ID.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(PostId);
define_id!(ContactId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_number() {
        let id = PostId::new(101);
        assert_eq!(serde_json::to_string(&id).unwrap(), "101");

        let parsed: PostId = serde_json::from_str("101").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_from_path_segment() {
        let id: UserId = "42".parse().unwrap();
        assert_eq!(id, UserId::new(42));
        assert!("forty-two".parse::<UserId>().is_err());
        assert!("-1".parse::<UserId>().is_err());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ContactId::new(9).to_string(), "9");
    }
}
