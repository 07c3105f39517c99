//! Owner identity type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`OwnerId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OwnerIdError {
    /// The input string is empty.
    #[error("owner id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("owner id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character that cannot appear in a path segment.
    #[error("owner id cannot contain {0:?}")]
    InvalidChar(char),
}

/// The key that scopes a cart and wishlist to one shopper.
///
/// Owner ids appear as a path segment in every owner-scoped endpoint
/// (`/api/cart/{owner}`), so they are restricted to a single segment.
///
/// ## Constraints
///
/// - Length: 1-128 characters
/// - No `/`, `?`, `#` and no whitespace
///
/// ## Examples
///
/// ```
/// use maison_core::OwnerId;
///
/// assert!(OwnerId::parse("guest-user").is_ok());
/// assert!(OwnerId::parse("").is_err());
/// assert!(OwnerId::parse("a/b").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Maximum length of an owner id.
    pub const MAX_LENGTH: usize = 128;

    /// Owner id used for anonymous browsing sessions.
    pub const GUEST: &'static str = "guest-user";

    /// Parse an `OwnerId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 128 characters,
    /// or contains a path separator, query/fragment marker, or whitespace.
    pub fn parse(s: &str) -> Result<Self, OwnerIdError> {
        if s.is_empty() {
            return Err(OwnerIdError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(OwnerIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| matches!(c, '/' | '?' | '#') || c.is_whitespace())
        {
            return Err(OwnerIdError::InvalidChar(c));
        }

        Ok(Self(s.to_owned()))
    }

    /// The anonymous guest owner.
    #[must_use]
    pub fn guest() -> Self {
        Self(Self::GUEST.to_owned())
    }

    /// Returns the owner id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the anonymous guest owner.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0 == Self::GUEST
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OwnerId {
    type Err = OwnerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OwnerId {
    type Error = OwnerIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OwnerId> for String {
    fn from(owner: OwnerId) -> Self {
        owner.0
    }
}

impl AsRef<str> for OwnerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(OwnerId::parse("guest-user").is_ok());
        assert!(OwnerId::parse("user_42").is_ok());
        assert!(OwnerId::parse("a").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(OwnerId::parse(""), Err(OwnerIdError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "a".repeat(OwnerId::MAX_LENGTH + 1);
        assert!(matches!(
            OwnerId::parse(&long),
            Err(OwnerIdError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_path_characters() {
        assert_eq!(OwnerId::parse("a/b"), Err(OwnerIdError::InvalidChar('/')));
        assert_eq!(OwnerId::parse("a b"), Err(OwnerIdError::InvalidChar(' ')));
        assert_eq!(OwnerId::parse("a?b"), Err(OwnerIdError::InvalidChar('?')));
    }

    #[test]
    fn test_guest() {
        let guest = OwnerId::guest();
        assert!(guest.is_guest());
        assert_eq!(guest.as_str(), "guest-user");
        assert!(!OwnerId::parse("alice").unwrap().is_guest());
    }

    #[test]
    fn test_serde_validates() {
        let owner: OwnerId = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(owner.as_str(), "alice");
        assert!(serde_json::from_str::<OwnerId>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&owner).unwrap(), "\"alice\"");
    }
}
