//! Shared error types for the services crate.

use thiserror::Error;

use crossword_core::model::{BoardError, CrosswordId, DraftError, GridError};
use storage::repository::StorageError;

/// Errors emitted by a puzzle session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("route not found")]
    RouteNotFound,
    #[error("crossword {0} not found")]
    CrosswordNotFound(CrosswordId),
    #[error("progress record could not be created")]
    ProgressUnavailable,
    #[error("no active progress record")]
    NoActiveProgress,
    #[error("no hints left")]
    NoHintsLeft,
    #[error("session is already completed or failed")]
    Finished,
    #[error("session runner has stopped")]
    RunnerClosed,
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AuthoringService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthoringError {
    #[error("profile is not allowed to create crosswords")]
    Forbidden,
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
