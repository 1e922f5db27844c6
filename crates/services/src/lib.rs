#![forbid(unsafe_code)]

pub mod authoring;
pub mod catalog;
pub mod config;
pub mod error;
pub mod sessions;

pub use crossword_core::Clock;

pub use authoring::{AuthoringService, CrosswordPreview};
pub use catalog::{CatalogService, LevelAccess, LevelEntry, LevelMenu, LevelStatus};
pub use config::SessionConfig;
pub use error::{AuthoringError, CatalogError, SessionError};
pub use sessions::{
    GuessOutcome, HintOutcome, PuzzleSession, SessionDeps, SessionHandle, SessionParams,
    SessionRunner, SessionView, TerminalDialog,
};
