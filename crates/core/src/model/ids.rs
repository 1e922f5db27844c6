use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the underlying u64 value
            #[must_use]
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map($name::new)
                    .map_err(|_| ParseIdError {
                        kind: stringify!($name),
                    })
            }
        }
    };
}

numeric_id!(
    /// Unique identifier for a crossword puzzle
    CrosswordId
);
numeric_id!(
    /// Server-assigned identifier of a progress row
    ProgressId
);
numeric_id!(
    /// Identifier of a single hint-usage row
    ClueUsageId
);
numeric_id!(
    /// Identifier of a tutorial-completion row
    LearningProgressId
);

/// Identifier of an authenticated profile (the auth provider's user id).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileId(Uuid);

impl ProfileId {
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProfileId({})", self.0)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProfileId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(ProfileId)
            .map_err(|_| ParseIdError { kind: "ProfileId" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossword_id_display_and_parse() {
        let id: CrosswordId = "123".parse().unwrap();
        assert_eq!(id, CrosswordId::new(123));
        assert_eq!(id.to_string(), "123");
        assert_eq!(format!("{id:?}"), "CrosswordId(123)");
    }

    #[test]
    fn numeric_id_rejects_garbage() {
        let err = "not-a-number".parse::<ProgressId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse ProgressId from string");
    }

    #[test]
    fn profile_id_parses_uuid() {
        let raw = "6f1c1b7e-8d0a-4a43-9a53-2f1f0c5c8a11";
        let id: ProfileId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
        assert!("user-1".parse::<ProfileId>().is_err());
    }
}
