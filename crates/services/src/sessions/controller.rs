use std::sync::Arc;

use crossword_core::Clock;
use crossword_core::model::{
    CellKey, Crossword, CrosswordBoard, HintBudget, ProgressId, ProgressRecord, PuzzleBoard,
    SessionContext, discrepancies,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use storage::cache::{LocalCache, progress_storage_key};
use storage::repository::{ClueUsageRepository, CrosswordRepository, ProgressRepository, Storage};
use tracing::{debug, error, info, warn};

use super::params::SessionParams;
use super::timers::{DisplayTick, SessionTimers};
use super::view::SessionView;
use super::writes::{ProgressWrite, WriteQueue};
use crate::config::SessionConfig;
use crate::error::SessionError;

/// Collaborators a puzzle session needs.
#[derive(Clone)]
pub struct SessionDeps {
    pub crosswords: Arc<dyn CrosswordRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub clue_usage: Arc<dyn ClueUsageRepository>,
    pub cache: Arc<dyn LocalCache>,
    pub clock: Clock,
}

impl SessionDeps {
    #[must_use]
    pub fn new(storage: &Storage, cache: Arc<dyn LocalCache>, clock: Clock) -> Self {
        Self {
            crosswords: Arc::clone(&storage.crosswords),
            progress: Arc::clone(&storage.progress),
            clue_usage: Arc::clone(&storage.clue_usage),
            cache,
            clock,
        }
    }
}

/// Result of an accepted cell edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessOutcome {
    /// This edit completed the puzzle.
    pub solved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintOutcome {
    Revealed {
        cell: CellKey,
        letter: char,
        /// The usage row was stored and the budget decreased.
        recorded: bool,
        solved: bool,
    },
    /// Every cell already holds its correct letter; no hint was spent.
    NothingToReveal,
}

/// Progress and timer state of one profile playing one crossword.
///
/// A session is owned by a single task. Remote progress writes go through a
/// [`WriteQueue`] and are never awaited by ticks or edits.
pub struct PuzzleSession {
    deps: SessionDeps,
    ctx: SessionContext,
    crossword: Crossword,
    board: CrosswordBoard,
    record: Option<ProgressRecord>,
    timers: SessionTimers,
    completed: bool,
    failed: bool,
    valid_guesses: bool,
    hints: HintBudget,
    writes: WriteQueue,
    cache_key: String,
    persist_step: u32,
    rng: StdRng,
}

impl PuzzleSession {
    /// Load the crossword and the latest progress row, creating a zeroed row
    /// on first visit.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::CrosswordNotFound` when no crossword matches the
    /// route, `SessionError::ProgressUnavailable` when a progress row cannot
    /// be read back after creating it, and `SessionError::Storage` for store
    /// failures on those reads.
    pub async fn bootstrap(
        deps: SessionDeps,
        ctx: SessionContext,
        params: SessionParams,
        config: &SessionConfig,
    ) -> Result<Self, SessionError> {
        let crossword = deps
            .crosswords
            .find_crossword(params.crossword_id, params.topic, params.difficulty)
            .await
            .inspect_err(|e| {
                error!(crossword_id = %params.crossword_id, error = %e, "failed to load crossword");
            })?
            .ok_or(SessionError::CrosswordNotFound(params.crossword_id))?;
        let board = CrosswordBoard::from_definition(crossword.definition())?;

        let writes = WriteQueue::spawn(
            Arc::clone(&deps.progress),
            Arc::clone(&deps.cache),
            deps.clock,
        );
        let mut session = Self {
            cache_key: progress_storage_key(crossword.id(), ctx.profile_id()),
            timers: SessionTimers::new(crossword.time_limit_secs()),
            persist_step: config.persist_step_secs(),
            deps,
            ctx,
            crossword,
            board,
            record: None,
            completed: false,
            failed: false,
            valid_guesses: true,
            hints: HintBudget::default(),
            writes,
            rng: StdRng::from_os_rng(),
        };
        session.load_progress().await?;
        Ok(session)
    }

    /// Replace the hint picker's random source, e.g. with a seeded one.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    async fn find_or_create(&self) -> Result<ProgressRecord, SessionError> {
        let crossword_id = self.crossword.id();
        let profile_id = self.ctx.profile_id();

        if let Some(record) = self.deps.progress.find_latest(crossword_id, profile_id).await? {
            return Ok(record);
        }
        let created = self
            .deps
            .progress
            .create_default(crossword_id, profile_id, self.deps.clock.now())
            .await?;
        debug!(%crossword_id, progress_id = %created, "created progress record");
        self.deps
            .progress
            .find_latest(crossword_id, profile_id)
            .await?
            .ok_or(SessionError::ProgressUnavailable)
    }

    async fn load_progress(&mut self) -> Result<(), SessionError> {
        let record = self.find_or_create().await?;
        self.apply_record(record);

        let used = self
            .deps
            .clue_usage
            .list_used_clues(self.crossword.id(), self.ctx.profile_id())
            .await
            .unwrap_or_else(|e| {
                warn!(crossword_id = %self.crossword.id(), error = %e, "failed to load used clues");
                Vec::new()
            });
        self.hints = HintBudget::new(used);
        Ok(())
    }

    fn apply_record(&mut self, record: ProgressRecord) {
        self.board.reset();
        self.cache_remove();

        match record.guesses() {
            Ok(None) => self.valid_guesses = true,
            Ok(Some(snapshot)) => {
                self.valid_guesses = true;
                match snapshot.to_json() {
                    Ok(json) => self.cache_set(&json),
                    Err(e) => warn!(progress_id = %record.id, error = %e, "failed to stage answers"),
                }
                self.board.restore(&snapshot);
            }
            Err(e) => {
                warn!(progress_id = %record.id, error = %e, "stored answers are unreadable");
                self.valid_guesses = false;
            }
        }

        if record.has_conflicting_flags() {
            warn!(
                progress_id = %record.id,
                "progress record is both completed and failed"
            );
        }
        self.completed = record.completed;
        self.failed = record.failed;
        self.timers.seed(record.time_spent_secs);
        info!(
            crossword_id = %self.crossword.id(),
            progress_id = %record.id,
            time_spent = record.time_spent_secs,
            completed = record.completed,
            failed = record.failed,
            "progress loaded"
        );
        self.record = Some(record);
    }

    fn cache_set(&self, value: &str) {
        if let Err(e) = self.deps.cache.set(&self.cache_key, value) {
            warn!(key = %self.cache_key, error = %e, "failed to write local cache");
        }
    }

    fn cache_remove(&self) {
        if let Err(e) = self.deps.cache.remove(&self.cache_key) {
            warn!(key = %self.cache_key, error = %e, "failed to clear local cache");
        }
    }

    fn stage_snapshot(&self) {
        let snapshot = self.board.snapshot(self.deps.clock.now().timestamp_millis());
        match snapshot.to_json() {
            Ok(json) => self.cache_set(&json),
            Err(e) => warn!(error = %e, "failed to serialize guesses"),
        }
    }

    fn is_terminal(&self) -> bool {
        self.completed || self.failed
    }

    fn require_record(&self) -> Result<ProgressId, SessionError> {
        self.record
            .as_ref()
            .map(|r| r.id)
            .ok_or(SessionError::NoActiveProgress)
    }

    fn require_playable(&self) -> Result<ProgressId, SessionError> {
        let id = self.require_record()?;
        if self.is_terminal() || self.timers.time_expired() {
            return Err(SessionError::Finished);
        }
        Ok(id)
    }

    //
    // ─── EDITS ─────────────────────────────────────────────────────────────────
    //

    /// Write (`Some`) or clear (`None`) one cell and stage the board in the
    /// local cache.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` once the attempt is over and
    /// `SessionError::Board` for cells outside the grid or non-letters.
    pub fn apply_guess(
        &mut self,
        cell: CellKey,
        letter: Option<char>,
    ) -> Result<GuessOutcome, SessionError> {
        self.require_playable()?;
        match letter {
            Some(letter) => self.board.set_guess(cell, letter)?,
            None => self.board.clear_guess(cell)?,
        }
        self.stage_snapshot();

        let solved = self.board.is_crossword_correct() && self.on_crossword_correct();
        Ok(GuessOutcome { solved })
    }

    /// Raised whenever the board may have become fully correct. Returns true
    /// only for the transition into completed.
    pub fn on_crossword_correct(&mut self) -> bool {
        if self.completed || !self.board.is_crossword_correct() {
            return false;
        }
        let Some(id) = self.record.as_ref().map(|r| r.id) else {
            return false;
        };
        self.completed = true;
        self.writes.submit(ProgressWrite::Completed { id });
        self.cache_remove();
        info!(crossword_id = %self.crossword.id(), progress_id = %id, "crossword completed");
        true
    }

    /// Send the staged snapshot to the store. Called when the edit debounce
    /// fires.
    pub fn flush_guesses(&mut self) {
        let Some(id) = self.record.as_ref().map(|r| r.id) else {
            return;
        };
        let answers = match self.deps.cache.get(&self.cache_key) {
            Ok(Some(answers)) => answers,
            Ok(None) => return,
            Err(e) => {
                warn!(key = %self.cache_key, error = %e, "failed to read staged answers");
                return;
            }
        };
        self.writes.submit(ProgressWrite::Answers {
            id,
            crossword_id: self.crossword.id(),
            profile_id: self.ctx.profile_id(),
            answers,
            cache_key: self.cache_key.clone(),
        });
    }

    //
    // ─── HINTS ─────────────────────────────────────────────────────────────────
    //

    /// Reveal one random wrong or empty cell.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoHintsLeft` once the budget is spent,
    /// `SessionError::Finished` when the attempt is over and
    /// `SessionError::NoActiveProgress` without a progress row.
    pub async fn reveal_hint(&mut self) -> Result<HintOutcome, SessionError> {
        self.require_record()?;
        if self.hints.no_hints_left() {
            return Err(SessionError::NoHintsLeft);
        }
        self.require_playable()?;

        let mut reference = self.board.blank_copy();
        reference.fill_all_answers();
        let taken_at = self.deps.clock.now().timestamp_millis();
        let missing = discrepancies(&self.board.snapshot(taken_at), &reference.snapshot(taken_at));
        if missing.is_empty() {
            return Ok(HintOutcome::NothingToReveal);
        }

        let (cell, answer) = &missing[self.rng.random_range(0..missing.len())];
        let Some(letter) = answer.chars().next() else {
            return Ok(HintOutcome::NothingToReveal);
        };
        self.board.set_guess(*cell, letter)?;
        self.stage_snapshot();

        let recorded = match self
            .deps
            .clue_usage
            .insert_used_clue(self.crossword.id(), self.ctx.profile_id(), self.deps.clock.now())
            .await
        {
            Ok(usage) => {
                self.hints.record(usage);
                true
            }
            Err(e) => {
                warn!(crossword_id = %self.crossword.id(), error = %e, "failed to record hint");
                false
            }
        };
        debug!(%cell, used = self.hints.used(), "hint revealed");

        let solved = self.board.is_crossword_correct() && self.on_crossword_correct();
        Ok(HintOutcome::Revealed {
            cell: *cell,
            letter,
            recorded,
            solved,
        })
    }

    //
    // ─── RESTART ───────────────────────────────────────────────────────────────
    //

    /// Throw the attempt away and start over with a fresh progress row.
    ///
    /// Queued writes for the old row finish first. Failed deletes are logged
    /// and not rolled back.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveProgress` without a progress row and
    /// the bootstrap errors of the re-read.
    pub async fn restart(&mut self) -> Result<(), SessionError> {
        let id = self.require_record()?;
        let crossword_id = self.crossword.id();
        let profile_id = self.ctx.profile_id();

        self.writes.flush().await;
        if let Err(e) = self.deps.progress.delete_progress(id).await {
            error!(%crossword_id, progress_id = %id, error = %e, "failed to delete progress");
        }
        if let Err(e) = self
            .deps
            .clue_usage
            .delete_used_clues(crossword_id, profile_id)
            .await
        {
            error!(%crossword_id, error = %e, "failed to delete used clues");
        }

        self.timers.reset();
        self.completed = false;
        self.failed = false;
        self.valid_guesses = true;
        self.hints.clear();
        self.board.reset();
        self.record = None;
        info!(%crossword_id, old_progress_id = %id, "restarting crossword");

        self.load_progress().await
    }

    //
    // ─── TIMERS ────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn display_timer_active(&self) -> bool {
        self.timers
            .display_active(self.record.is_some(), self.is_terminal())
    }

    #[must_use]
    pub fn persist_timer_active(&self) -> bool {
        self.timers.persist_active(self.is_terminal())
    }

    /// One display second. Expiry marks the attempt failed remotely.
    pub fn tick_display(&mut self) {
        if !self.display_timer_active() {
            return;
        }
        if let DisplayTick::Expired(time_limit) = self.timers.tick_display() {
            if let Some(id) = self.record.as_ref().map(|r| r.id) {
                self.writes.submit(ProgressWrite::Expired { id, time_limit });
            }
            info!(crossword_id = %self.crossword.id(), time_limit, "time expired");
        }
    }

    /// One flush period of elapsed time.
    pub fn tick_persist(&mut self) {
        if !self.persist_timer_active() {
            return;
        }
        let Some(secs) = self.timers.tick_persist(self.persist_step) else {
            return;
        };
        if let Some(id) = self.record.as_ref().map(|r| r.id) {
            self.writes.submit(ProgressWrite::TimeSpent { id, secs });
        }
    }

    //
    // ─── READ SIDE ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            crossword_id: self.crossword.id(),
            progress_id: self.record.as_ref().map(|r| r.id),
            title: self.crossword.title().to_string(),
            description: self.crossword.description().map(ToString::to_string),
            time_limit_secs: self.timers.time_limit(),
            elapsed_secs: self.timers.display(),
            time_remaining_secs: self.timers.remaining(),
            time_expired: self.timers.time_expired(),
            completed: self.completed,
            failed: self.failed,
            hints_used: self.hints.used(),
            no_hints_left: self.hints.no_hints_left(),
            valid_guesses: self.valid_guesses,
            saving: self.writes.pending() > 0,
            cells: self.board.cells().collect(),
        }
    }

    #[must_use]
    pub fn crossword(&self) -> &Crossword {
        &self.crossword
    }

    #[must_use]
    pub fn board(&self) -> &CrosswordBoard {
        &self.board
    }

    #[must_use]
    pub fn progress_id(&self) -> Option<ProgressId> {
        self.record.as_ref().map(|r| r.id)
    }

    #[must_use]
    pub fn timers(&self) -> &SessionTimers {
        &self.timers
    }

    #[must_use]
    pub fn hints(&self) -> &HintBudget {
        &self.hints
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Wait for every queued remote write.
    pub async fn flush_writes(&self) {
        self.writes.flush().await;
    }

    /// Drain the write queue and tear the session down.
    pub async fn shutdown(self) {
        self.writes.shutdown().await;
    }
}
