use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::clues::CluesInput;
use crate::model::ids::{CrosswordId, ProfileId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CrosswordError {
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("crossword title cannot be empty")]
    EmptyTitle,
}

//
// ─── TOPIC & DIFFICULTY ────────────────────────────────────────────────────────
//

/// Learning topic a crossword belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Topic {
    Scrum,
    Pmbok,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::Scrum, Topic::Pmbok];

    /// Storage and route representation (`SCRUM`, `PMBOK`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Scrum => "SCRUM",
            Topic::Pmbok => "PMBOK",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = CrosswordError;

    /// Case-insensitive: routes carry lowercase segments, storage uppercase.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCRUM" => Ok(Topic::Scrum),
            "PMBOK" => Ok(Topic::Pmbok),
            _ => Err(CrosswordError::UnknownTopic(s.to_string())),
        }
    }
}

/// Difficulty tier, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }

    /// The next easier tier, if any.
    #[must_use]
    pub fn prev(self) -> Option<Self> {
        match self {
            Difficulty::Easy => None,
            Difficulty::Medium => Some(Difficulty::Easy),
            Difficulty::Hard => Some(Difficulty::Medium),
        }
    }

    /// The next harder tier, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Difficulty::Easy => Some(Difficulty::Medium),
            Difficulty::Medium => Some(Difficulty::Hard),
            Difficulty::Hard => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = CrosswordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EASY" => Ok(Difficulty::Easy),
            "MEDIUM" => Ok(Difficulty::Medium),
            "HARD" => Ok(Difficulty::Hard),
            _ => Err(CrosswordError::UnknownDifficulty(s.to_string())),
        }
    }
}

//
// ─── CROSSWORD ─────────────────────────────────────────────────────────────────
//

/// A published crossword puzzle. Read-only to play sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct Crossword {
    id: CrosswordId,
    title: String,
    description: Option<String>,
    topic: Topic,
    difficulty: Difficulty,
    time_limit_secs: u32,
    definition: CluesInput,
    created_by: Option<ProfileId>,
    created_at: DateTime<Utc>,
}

impl Crossword {
    /// Rehydrate a crossword from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `CrosswordError::EmptyTitle` if the title is blank.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: CrosswordId,
        title: impl Into<String>,
        description: Option<String>,
        topic: Topic,
        difficulty: Difficulty,
        time_limit_secs: u32,
        definition: CluesInput,
        created_by: Option<ProfileId>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CrosswordError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CrosswordError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            description,
            topic,
            difficulty,
            time_limit_secs,
            definition,
            created_by,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> CrosswordId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn topic(&self) -> Topic {
        self.topic
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Time limit in seconds; 0 means unlimited.
    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.time_limit_secs > 0
    }

    #[must_use]
    pub fn definition(&self) -> &CluesInput {
        &self.definition
    }

    #[must_use]
    pub fn created_by(&self) -> Option<ProfileId> {
        self.created_by
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_parses_route_segments_case_insensitively() {
        assert_eq!("scrum".parse::<Topic>(), Ok(Topic::Scrum));
        assert_eq!("PMBOK".parse::<Topic>(), Ok(Topic::Pmbok));
        assert!("kanban".parse::<Topic>().is_err());
    }

    #[test]
    fn difficulty_navigation_stops_at_the_ends() {
        assert_eq!(Difficulty::Easy.prev(), None);
        assert_eq!(Difficulty::Easy.next(), Some(Difficulty::Medium));
        assert_eq!(Difficulty::Hard.next(), None);
        assert_eq!(Difficulty::Hard.prev(), Some(Difficulty::Medium));
    }

    #[test]
    fn difficulty_serializes_uppercase() {
        let json = serde_json::to_string(&Difficulty::Medium).unwrap();
        assert_eq!(json, "\"MEDIUM\"");
    }
}
