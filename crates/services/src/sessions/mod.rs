mod controller;
mod params;
mod runner;
mod timers;
mod view;
mod writes;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::{GuessOutcome, HintOutcome, PuzzleSession, SessionDeps};
pub use params::SessionParams;
pub use runner::{SessionHandle, SessionRunner};
pub use timers::{DisplayTick, SessionTimers};
pub use view::{SessionView, TerminalDialog};
pub use writes::{ProgressWrite, WriteQueue};
