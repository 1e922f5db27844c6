use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::model::guesses::{CellKey, normalize_letter};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GridError {
    #[error("crossword has no clues")]
    NoClues,

    #[error("{direction} clue {number} has an empty answer")]
    EmptyAnswer { direction: Direction, number: u32 },

    #[error("{direction} clue {number} contains non-letter {found:?}")]
    InvalidLetter {
        direction: Direction,
        number: u32,
        found: char,
    },

    #[error("cell {cell} is {existing:?} in one clue and {incoming:?} in another")]
    Conflict {
        cell: CellKey,
        existing: char,
        incoming: char,
    },
}

/// Reading direction of a clue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Across,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => f.write_str("across"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// One clue with its answer and the cell of its first letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueEntry {
    pub clue: String,
    pub answer: String,
    pub row: u32,
    pub col: u32,
}

impl ClueEntry {
    #[must_use]
    pub fn new(clue: impl Into<String>, answer: impl Into<String>, row: u32, col: u32) -> Self {
        Self {
            clue: clue.into(),
            answer: answer.into(),
            row,
            col,
        }
    }

    /// Cells covered by this clue's answer, in reading order.
    pub fn cells(&self, direction: Direction) -> impl Iterator<Item = CellKey> + '_ {
        let (row, col) = (self.row, self.col);
        (0_u32..).zip(self.answer.chars()).map(move |(offset, _)| match direction {
            Direction::Across => CellKey::new(row, col + offset),
            Direction::Down => CellKey::new(row + offset, col),
        })
    }
}

/// Puzzle definition, numbered clues in both directions.
///
/// Serializes to `{"across": {"1": {...}}, "down": {...}}`, the shape stored
/// in `crosswords.data`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CluesInput {
    #[serde(default)]
    pub across: BTreeMap<u32, ClueEntry>,
    #[serde(default)]
    pub down: BTreeMap<u32, ClueEntry>,
}

impl CluesInput {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.across.is_empty() && self.down.is_empty()
    }

    /// All clues as `(direction, number, entry)`, across first.
    pub fn clues(&self) -> impl Iterator<Item = (Direction, u32, &ClueEntry)> {
        self.across
            .iter()
            .map(|(n, c)| (Direction::Across, *n, c))
            .chain(self.down.iter().map(|(n, c)| (Direction::Down, *n, c)))
    }

    /// Builds the solved grid: every covered cell mapped to its uppercase letter.
    ///
    /// # Errors
    ///
    /// Returns `GridError` when there are no clues, an answer is empty or has a
    /// non-letter, or two clues disagree on a shared cell.
    pub fn solution_cells(&self) -> Result<BTreeMap<CellKey, char>, GridError> {
        if self.is_empty() {
            return Err(GridError::NoClues);
        }

        let mut cells = BTreeMap::new();
        for (direction, number, entry) in self.clues() {
            if entry.answer.trim().is_empty() {
                return Err(GridError::EmptyAnswer { direction, number });
            }
            for (cell, letter) in entry.cells(direction).zip(entry.answer.chars()) {
                let Some(incoming) = normalize_letter(letter) else {
                    return Err(GridError::InvalidLetter {
                        direction,
                        number,
                        found: letter,
                    });
                };
                match cells.insert(cell, incoming) {
                    Some(existing) if existing != incoming => {
                        return Err(GridError::Conflict {
                            cell,
                            existing,
                            incoming,
                        });
                    }
                    _ => {}
                }
            }
        }
        Ok(cells)
    }

    /// Side length of the smallest square grid holding every answer.
    #[must_use]
    pub fn grid_size(&self) -> u32 {
        self.clues()
            .flat_map(|(direction, _, entry)| entry.cells(direction))
            .map(|cell| cell.row.max(cell.col) + 1)
            .max()
            .unwrap_or(0)
    }
}
