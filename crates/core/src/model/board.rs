use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::clues::{CluesInput, GridError};
use crate::model::guesses::{CellKey, GuessSnapshot, normalize_letter};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BoardError {
    #[error("cell {0} is not part of the grid")]
    UnknownCell(CellKey),

    #[error("{0:?} is not a letter")]
    InvalidLetter(char),
}

/// Imperative operations offered by a rendered crossword grid.
///
/// Sessions drive the live board through this trait and build a second,
/// unlinked instance from the same definition when they need the solved
/// reference.
pub trait PuzzleBoard: Send {
    /// Writes the correct letter into every cell.
    fn fill_all_answers(&mut self);

    /// True when every cell holds its correct letter.
    fn is_crossword_correct(&self) -> bool;

    /// # Errors
    ///
    /// Returns `BoardError` for cells outside the grid or non-letters.
    fn set_guess(&mut self, cell: CellKey, letter: char) -> Result<(), BoardError>;

    /// # Errors
    ///
    /// Returns `BoardError::UnknownCell` for cells outside the grid.
    fn clear_guess(&mut self, cell: CellKey) -> Result<(), BoardError>;

    /// Clears every guess.
    fn reset(&mut self);

    fn snapshot(&self, taken_at_ms: i64) -> GuessSnapshot;

    /// Replaces the current guesses with those of `snapshot`, skipping cells
    /// that are not in the grid or do not hold a single letter.
    fn restore(&mut self, snapshot: &GuessSnapshot);
}

/// In-memory crossword grid built from a [`CluesInput`] definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrosswordBoard {
    solution: BTreeMap<CellKey, char>,
    guesses: BTreeMap<CellKey, char>,
}

impl CrosswordBoard {
    /// # Errors
    ///
    /// Returns `GridError` if the definition does not form a consistent grid.
    pub fn from_definition(definition: &CluesInput) -> Result<Self, GridError> {
        Ok(Self {
            solution: definition.solution_cells()?,
            guesses: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.solution.len()
    }

    #[must_use]
    pub fn guess_at(&self, cell: CellKey) -> Option<char> {
        self.guesses.get(&cell).copied()
    }

    #[must_use]
    pub fn contains(&self, cell: CellKey) -> bool {
        self.solution.contains_key(&cell)
    }

    /// Every grid cell with its current guess, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (CellKey, Option<char>)> + '_ {
        self.solution
            .keys()
            .map(|cell| (*cell, self.guesses.get(cell).copied()))
    }

    /// A fresh, empty board over the same grid.
    #[must_use]
    pub fn blank_copy(&self) -> Self {
        Self {
            solution: self.solution.clone(),
            guesses: BTreeMap::new(),
        }
    }
}

impl PuzzleBoard for CrosswordBoard {
    fn fill_all_answers(&mut self) {
        self.guesses.clone_from(&self.solution);
    }

    fn is_crossword_correct(&self) -> bool {
        self.solution
            .iter()
            .all(|(cell, letter)| self.guesses.get(cell) == Some(letter))
    }

    fn set_guess(&mut self, cell: CellKey, letter: char) -> Result<(), BoardError> {
        if !self.contains(cell) {
            return Err(BoardError::UnknownCell(cell));
        }
        let letter = normalize_letter(letter).ok_or(BoardError::InvalidLetter(letter))?;
        self.guesses.insert(cell, letter);
        Ok(())
    }

    fn clear_guess(&mut self, cell: CellKey) -> Result<(), BoardError> {
        if !self.contains(cell) {
            return Err(BoardError::UnknownCell(cell));
        }
        self.guesses.remove(&cell);
        Ok(())
    }

    fn reset(&mut self) {
        self.guesses.clear();
    }

    fn snapshot(&self, taken_at_ms: i64) -> GuessSnapshot {
        let guesses = self
            .guesses
            .iter()
            .map(|(cell, letter)| (*cell, letter.to_string()))
            .collect();
        GuessSnapshot::new(taken_at_ms, guesses)
    }

    fn restore(&mut self, snapshot: &GuessSnapshot) {
        self.guesses.clear();
        for (cell, raw) in &snapshot.guesses {
            let mut chars = raw.chars();
            let (Some(letter), None) = (chars.next(), chars.next()) else {
                continue;
            };
            if !self.contains(*cell) {
                continue;
            }
            if let Some(letter) = normalize_letter(letter) {
                self.guesses.insert(*cell, letter);
            }
        }
    }
}

/// Cells of `reference` whose letter differs from (or is missing in) `current`.
#[must_use]
pub fn discrepancies(current: &GuessSnapshot, reference: &GuessSnapshot) -> Vec<(CellKey, String)> {
    reference
        .guesses
        .iter()
        .filter(|(cell, letter)| current.guesses.get(*cell) != Some(*letter))
        .map(|(cell, letter)| (*cell, letter.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::clues::ClueEntry;

    fn board() -> CrosswordBoard {
        let mut input = CluesInput::default();
        input.across.insert(1, ClueEntry::new("Daily meeting", "STANDUP", 0, 0));
        input.down.insert(2, ClueEntry::new("Team lead role", "SM", 0, 0));
        CrosswordBoard::from_definition(&input).unwrap()
    }

    #[test]
    fn filled_board_is_correct() {
        let mut b = board();
        assert!(!b.is_crossword_correct());
        b.fill_all_answers();
        assert!(b.is_crossword_correct());
        b.reset();
        assert!(!b.is_crossword_correct());
    }

    #[test]
    fn set_guess_normalizes_and_validates() {
        let mut b = board();
        b.set_guess(CellKey::new(1, 0), 'm').unwrap();
        assert_eq!(b.guess_at(CellKey::new(1, 0)), Some('M'));
        assert_eq!(
            b.set_guess(CellKey::new(5, 5), 'A'),
            Err(BoardError::UnknownCell(CellKey::new(5, 5)))
        );
        assert_eq!(b.set_guess(CellKey::new(0, 0), '?'), Err(BoardError::InvalidLetter('?')));
    }

    #[test]
    fn snapshot_restores_onto_a_blank_copy() {
        let mut b = board();
        b.set_guess(CellKey::new(0, 0), 'S').unwrap();
        b.set_guess(CellKey::new(0, 1), 'T').unwrap();
        let snap = b.snapshot(42);

        let mut other = b.blank_copy();
        other.restore(&snap);
        assert_eq!(other, b);
    }

    #[test]
    fn restore_skips_foreign_cells_and_multi_letter_values() {
        let mut b = board();
        let mut guesses = BTreeMap::new();
        guesses.insert(CellKey::new(0, 0), "s".to_string());
        guesses.insert(CellKey::new(0, 1), "TT".to_string());
        guesses.insert(CellKey::new(9, 9), "X".to_string());
        b.restore(&GuessSnapshot::new(0, guesses));
        assert_eq!(b.guess_at(CellKey::new(0, 0)), Some('S'));
        assert_eq!(b.guess_at(CellKey::new(0, 1)), None);
        assert!(!b.contains(CellKey::new(9, 9)));
    }

    #[test]
    fn discrepancies_list_missing_and_wrong_cells() {
        let mut live = board();
        live.set_guess(CellKey::new(0, 0), 'S').unwrap();
        live.set_guess(CellKey::new(0, 1), 'X').unwrap();
        let mut solved = live.blank_copy();
        solved.fill_all_answers();

        let diff = discrepancies(&live.snapshot(0), &solved.snapshot(0));
        // 8 cells total, only (0,0) is right
        assert_eq!(diff.len(), 7);
        assert!(diff.iter().all(|(cell, _)| *cell != CellKey::new(0, 0)));
        assert!(diff.contains(&(CellKey::new(0, 1), "T".to_string())));
    }
}
