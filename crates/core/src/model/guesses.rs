use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GuessError {
    #[error("invalid cell key {0:?}, expected <row>_<col>")]
    InvalidCellKey(String),

    #[error("guess snapshot is not valid JSON: {0}")]
    Json(String),

    #[error("guess snapshot has no guesses map")]
    MissingGuesses,
}

/// Uppercases a single letter; `None` if it is not alphabetic.
#[must_use]
pub fn normalize_letter(letter: char) -> Option<char> {
    if !letter.is_alphabetic() {
        return None;
    }
    letter.to_uppercase().next()
}

//
// ─── CELL KEY ──────────────────────────────────────────────────────────────────
//

/// Grid coordinate, encoded as `"<row>_<col>"` in guess snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub row: u32,
    pub col: u32,
}

impl CellKey {
    #[must_use]
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.row, self.col)
    }
}

impl FromStr for CellKey {
    type Err = GuessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GuessError::InvalidCellKey(s.to_string());
        let (row, col) = s.split_once('_').ok_or_else(invalid)?;
        let row = row.parse::<u32>().map_err(|_| invalid())?;
        let col = col.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self { row, col })
    }
}

impl Serialize for CellKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Full guess state of a board as staged in the local cache and persisted in
/// `user_progress.current_answers`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GuessSnapshot {
    /// Milliseconds since the epoch when the snapshot was taken.
    #[serde(default)]
    pub date: i64,
    pub guesses: BTreeMap<CellKey, String>,
}

impl GuessSnapshot {
    #[must_use]
    pub fn new(date: i64, guesses: BTreeMap<CellKey, String>) -> Self {
        Self { date, guesses }
    }

    /// Strict parse that reports why a raw snapshot is unusable.
    ///
    /// # Errors
    ///
    /// Returns `GuessError::Json` for malformed JSON and
    /// `GuessError::MissingGuesses` when the payload lacks a usable `guesses` map.
    pub fn parse_json(raw: &str) -> Result<Self, GuessError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| GuessError::Json(e.to_string()))?;
        if !value.get("guesses").is_some_and(serde_json::Value::is_object) {
            return Err(GuessError::MissingGuesses);
        }
        serde_json::from_value(value).map_err(|_| GuessError::MissingGuesses)
    }

    /// Lenient parse: `None` for anything that is not a recognizable guess map.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::parse_json(raw).ok()
    }

    /// # Errors
    ///
    /// Returns `GuessError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, GuessError> {
        serde_json::to_string(self).map_err(|e| GuessError::Json(e.to_string()))
    }

    #[must_use]
    pub fn letter_at(&self, cell: CellKey) -> Option<&str> {
        self.guesses.get(&cell).map(String::as_str)
    }
}
