use crossword_core::model::CellKey;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep_until};
use tracing::{debug, warn};

use super::controller::{GuessOutcome, HintOutcome, PuzzleSession};
use super::view::SessionView;
use crate::config::SessionConfig;
use crate::error::SessionError;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

enum SessionCommand {
    Guess {
        cell: CellKey,
        letter: Option<char>,
        reply: Reply<GuessOutcome>,
    },
    RevealHint {
        reply: Reply<HintOutcome>,
    },
    Restart {
        reply: Reply<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Drives a [`PuzzleSession`] on its own task: both timers, the edit
/// debounce and player commands are multiplexed there, so the session is
/// never touched concurrently.
pub struct SessionRunner;

impl SessionRunner {
    /// Move the session onto a new task and return a handle to it.
    #[must_use]
    pub fn spawn(session: PuzzleSession, config: SessionConfig) -> SessionHandle {
        let (commands, rx) = mpsc::channel(32);
        let (view_tx, view) = watch::channel(session.view());
        let task = tokio::spawn(run(session, config, rx, view_tx));
        SessionHandle {
            commands,
            view,
            task,
        }
    }
}

/// Client side of a running session.
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    view: watch::Receiver<SessionView>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| SessionError::RunnerClosed)?;
        rx.await.map_err(|_| SessionError::RunnerClosed)?
    }

    /// # Errors
    ///
    /// Returns the session's rejection of the edit, or
    /// `SessionError::RunnerClosed` after shutdown.
    pub async fn guess(&self, cell: CellKey, letter: char) -> Result<GuessOutcome, SessionError> {
        self.request(|reply| SessionCommand::Guess {
            cell,
            letter: Some(letter),
            reply,
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the session's rejection of the edit, or
    /// `SessionError::RunnerClosed` after shutdown.
    pub async fn clear(&self, cell: CellKey) -> Result<GuessOutcome, SessionError> {
        self.request(|reply| SessionCommand::Guess {
            cell,
            letter: None,
            reply,
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `SessionError::NoHintsLeft` once the budget is spent, or
    /// `SessionError::RunnerClosed` after shutdown.
    pub async fn reveal_hint(&self) -> Result<HintOutcome, SessionError> {
        self.request(|reply| SessionCommand::RevealHint { reply })
            .await
    }

    /// # Errors
    ///
    /// Returns the restart failure, or `SessionError::RunnerClosed` after shutdown.
    pub async fn restart(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Restart { reply }).await
    }

    /// Latest published view.
    #[must_use]
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Flush pending edits, drain remote writes and stop the task.
    pub async fn shutdown(self) {
        let (reply, done) = oneshot::channel();
        if self
            .commands
            .send(SessionCommand::Shutdown { reply })
            .await
            .is_ok()
        {
            let _ = done.await;
        }
        if let Err(e) = self.task.await {
            warn!(error = %e, "session task ended abnormally");
        }
    }
}

fn arm(period: std::time::Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn run(
    mut session: PuzzleSession,
    config: SessionConfig,
    mut commands: mpsc::Receiver<SessionCommand>,
    view_tx: watch::Sender<SessionView>,
) {
    let mut display = arm(config.display_tick);
    let mut persist = arm(config.persist_tick);
    let mut debounce: Option<Instant> = None;

    loop {
        let display_on = session.display_timer_active();
        let persist_on = session.persist_timer_active();

        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(SessionCommand::Guess { cell, letter, reply }) => {
                    let result = session.apply_guess(cell, letter);
                    if result.is_ok() {
                        debounce = Some(Instant::now() + config.guess_debounce);
                    }
                    let _ = reply.send(result);
                }
                Some(SessionCommand::RevealHint { reply }) => {
                    let result = session.reveal_hint().await;
                    if matches!(result, Ok(HintOutcome::Revealed { .. })) {
                        debounce = Some(Instant::now() + config.guess_debounce);
                    }
                    let _ = reply.send(result);
                }
                Some(SessionCommand::Restart { reply }) => {
                    debounce = None;
                    let result = session.restart().await;
                    display = arm(config.display_tick);
                    persist = arm(config.persist_tick);
                    let _ = reply.send(result);
                }
                Some(SessionCommand::Shutdown { reply }) => {
                    finish(session, debounce, &view_tx).await;
                    let _ = reply.send(());
                    return;
                }
                None => {
                    finish(session, debounce, &view_tx).await;
                    return;
                }
            },
            _ = display.tick(), if display_on => session.tick_display(),
            _ = persist.tick(), if persist_on => session.tick_persist(),
            () = sleep_until(debounce.unwrap_or_else(Instant::now)), if debounce.is_some() => {
                debounce = None;
                session.flush_guesses();
            }
        }

        view_tx.send_replace(session.view());
    }
}

async fn finish(
    mut session: PuzzleSession,
    debounce: Option<Instant>,
    view_tx: &watch::Sender<SessionView>,
) {
    if debounce.is_some() {
        session.flush_guesses();
    }
    session.flush_writes().await;
    view_tx.send_replace(session.view());
    debug!(crossword_id = %session.crossword().id(), "session runner stopped");
    session.shutdown().await;
}
