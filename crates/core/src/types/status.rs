//! Contact submission status.

use serde::{Deserialize, Serialize};

/// Where a contact submission stands in the team's follow-up.
///
/// The usual progression is `pending` -> `responded` -> `closed`, but the
/// API accepts any value at any time and so does this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    Pending,
    Responded,
    Closed,
}

impl ContactStatus {
    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Responded => 1,
            Self::Closed => 2,
        }
    }

    /// Whether moving from `previous` to `self` goes against the usual
    /// progression, e.g. reopening a closed submission.
    #[must_use]
    pub const fn is_backward_from(self, previous: Self) -> bool {
        self.rank() < previous.rank()
    }
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Responded => write!(f, "responded"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "responded" => Ok(Self::Responded),
            "closed" => Ok(Self::Closed),
            _ => Err(format!("invalid contact status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&ContactStatus::Responded).unwrap(),
            "\"responded\""
        );
        let parsed: ContactStatus = serde_json::from_str("\"closed\"").unwrap();
        assert_eq!(parsed, ContactStatus::Closed);
    }

    #[test]
    fn test_display_matches_from_str() {
        for status in [
            ContactStatus::Pending,
            ContactStatus::Responded,
            ContactStatus::Closed,
        ] {
            assert_eq!(status.to_string().parse::<ContactStatus>().unwrap(), status);
        }
        assert!("archived".parse::<ContactStatus>().is_err());
    }

    #[test]
    fn test_backward_moves() {
        assert!(ContactStatus::Pending.is_backward_from(ContactStatus::Closed));
        assert!(!ContactStatus::Closed.is_backward_from(ContactStatus::Pending));
        assert!(!ContactStatus::Responded.is_backward_from(ContactStatus::Responded));
    }
}
