use thiserror::Error;

use crate::model::{
    BoardError, CrosswordError, DraftError, GridError, GuessError, ParseIdError, ProfileError,
};
use crate::time::IntervalError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Interval(#[from] IntervalError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Guess(#[from] GuessError),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Crossword(#[from] CrosswordError),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
}
