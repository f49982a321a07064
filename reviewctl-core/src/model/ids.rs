//! Validated identifiers
//!
//! Team names, user IDs and PR IDs are opaque strings chosen by clients.
//! The only rules are: not blank, at most 255 bytes (the column width).

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Maximum length for any identifier, in bytes
pub const MAX_IDENTIFIER_LEN: usize = 255;

fn validate(field: &'static str, s: &str) -> Result<(), ValidationError> {
    if s.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    check_length(field, s)
}

/// Reject free text (names, usernames) longer than the column width.
pub fn check_length(field: &'static str, s: &str) -> Result<(), ValidationError> {
    if s.len() > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_IDENTIFIER_LEN,
        });
    }
    Ok(())
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
                let s = s.into();
                validate($field, &s)?;
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// Unique team name
    TeamName,
    "team_name"
);

identifier!(
    /// Unique user ID (global across teams)
    UserId,
    "user_id"
);

identifier!(
    /// Unique pull request ID
    PrId,
    "pull_request_id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_ids() {
        assert!(TeamName::new("backend").is_ok());
        assert!(UserId::new("u1").is_ok());
        assert!(PrId::new("pr-1001").is_ok());
    }

    #[test]
    fn rejects_blank() {
        let err = UserId::new("").unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "user_id" });

        let err = PrId::new("   ").unwrap_err();
        assert_eq!(
            err,
            ValidationError::Empty {
                field: "pull_request_id"
            }
        );
    }

    #[test]
    fn max_length() {
        assert!(TeamName::new("a".repeat(255)).is_ok());

        let err = TeamName::new("a".repeat(256)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 255, .. }));
    }

    #[test]
    fn free_text_may_be_empty_but_bounded() {
        assert!(check_length("username", "").is_ok());
        assert!(check_length("username", &"x".repeat(256)).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let id: UserId = serde_json::from_str("\"u42\"").unwrap();
        assert_eq!(id.as_str(), "u42");

        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = PrId::new("pr-7").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"pr-7\"");
    }
}
