use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::clues::{ClueEntry, CluesInput, GridError};
use crate::model::crossword::{Difficulty, Topic};
use crate::model::ids::ProfileId;
use crate::time::interval_to_secs;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DraftError {
    #[error("title is required")]
    MissingTitle,

    #[error("description is required")]
    MissingDescription,

    #[error("time limit must look like HH:MM:SS, got {0:?}")]
    InvalidTimeLimit(String),

    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Author-supplied crossword before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrosswordDraft {
    pub title: String,
    pub description: String,
    pub topic: Topic,
    pub difficulty: Difficulty,
    /// `HH:MM:SS`; `00:00:00` publishes an untimed puzzle.
    pub time_limit: String,
    #[serde(default)]
    pub across: Vec<ClueEntry>,
    #[serde(default)]
    pub down: Vec<ClueEntry>,
}

/// A validated crossword ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCrossword {
    pub title: String,
    pub description: String,
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub time_limit_secs: u32,
    pub definition: CluesInput,
    pub created_by: Option<ProfileId>,
}

impl CrosswordDraft {
    /// Validate and normalize the draft.
    ///
    /// Clues are numbered from 1 in input order per direction and answers are
    /// uppercased.
    ///
    /// # Errors
    ///
    /// Returns `DraftError` for blank fields, a malformed time limit, or a
    /// definition that does not form a consistent grid.
    pub fn validate(self, created_by: Option<ProfileId>) -> Result<NewCrossword, DraftError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(DraftError::MissingTitle);
        }
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(DraftError::MissingDescription);
        }
        if !is_hh_mm_ss(&self.time_limit) {
            return Err(DraftError::InvalidTimeLimit(self.time_limit));
        }
        let time_limit_secs = interval_to_secs(&self.time_limit)
            .map_err(|_| DraftError::InvalidTimeLimit(self.time_limit.clone()))?;

        let definition = CluesInput {
            across: number_clues(self.across),
            down: number_clues(self.down),
        };
        definition.solution_cells()?;

        Ok(NewCrossword {
            title,
            description,
            topic: self.topic,
            difficulty: self.difficulty,
            time_limit_secs,
            definition,
            created_by,
        })
    }
}

fn number_clues(clues: Vec<ClueEntry>) -> std::collections::BTreeMap<u32, ClueEntry> {
    (1_u32..)
        .zip(clues)
        .map(|(number, clue)| {
            let answer = clue.answer.trim().to_uppercase();
            (number, ClueEntry { answer, ..clue })
        })
        .collect()
}

fn is_hh_mm_ss(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 8
        && bytes.iter().enumerate().all(|(i, b)| match i {
            2 | 5 => *b == b':',
            _ => b.is_ascii_digit(),
        })
}
