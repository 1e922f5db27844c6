mod board;
mod clues;
mod crossword;
mod draft;
mod guesses;
mod hint;
mod ids;
mod learning;
mod profile;
mod progress;

pub use ids::{ClueUsageId, CrosswordId, LearningProgressId, ParseIdError, ProfileId, ProgressId};

pub use board::{BoardError, CrosswordBoard, PuzzleBoard, discrepancies};
pub use clues::{ClueEntry, CluesInput, Direction, GridError};
pub use crossword::{Crossword, CrosswordError, Difficulty, Topic};
pub use draft::{CrosswordDraft, DraftError, NewCrossword};
pub use guesses::{CellKey, GuessError, GuessSnapshot, normalize_letter};
pub use hint::{ClueUsage, HINT_BUDGET, HintBudget};
pub use learning::LearningProgress;
pub use profile::{AppRole, Permission, Profile, ProfileError, SessionContext};
pub use progress::{ProgressPatch, ProgressRecord};
