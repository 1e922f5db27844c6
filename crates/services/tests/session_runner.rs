use std::sync::Arc;
use std::time::Duration;

use crossword_core::model::{
    CellKey, ClueEntry, CluesInput, CrosswordId, Difficulty, GuessSnapshot, NewCrossword,
    ProfileId, ProgressId, ProgressPatch, ProgressRecord, SessionContext, Topic,
};
use crossword_core::time::fixed_now;
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{
    Clock, HintOutcome, PuzzleSession, SessionConfig, SessionDeps, SessionError, SessionParams,
    SessionRunner,
};
use storage::cache::{LocalCache, MemoryCache};
use storage::repository::{
    ClueUsageRepository, CrosswordRepository, InMemoryRepository, ProgressRepository,
    RecordedWrite, Storage,
};

// SPRINT across and SCRUM down share the S at 0_0.
const SOLUTION: [(u32, u32, char); 10] = [
    (0, 0, 'S'),
    (0, 1, 'P'),
    (0, 2, 'R'),
    (0, 3, 'I'),
    (0, 4, 'N'),
    (0, 5, 'T'),
    (1, 0, 'C'),
    (2, 0, 'R'),
    (3, 0, 'U'),
    (4, 0, 'M'),
];

struct Fixture {
    repo: InMemoryRepository,
    cache: Arc<MemoryCache>,
    ctx: SessionContext,
    crossword_id: CrosswordId,
}

impl Fixture {
    async fn new(time_limit_secs: u32) -> Self {
        let repo = InMemoryRepository::new();
        let mut definition = CluesInput::default();
        definition
            .across
            .insert(1, ClueEntry::new("Timeboxed iteration", "SPRINT", 0, 0));
        definition
            .down
            .insert(1, ClueEntry::new("Framework", "SCRUM", 0, 0));
        let crossword_id = repo
            .insert_crossword(
                &NewCrossword {
                    title: "Scrum basics".into(),
                    description: "Warm-up".into(),
                    topic: Topic::Scrum,
                    difficulty: Difficulty::Easy,
                    time_limit_secs,
                    definition,
                    created_by: None,
                },
                fixed_now(),
            )
            .await
            .unwrap();
        Self {
            repo,
            cache: Arc::new(MemoryCache::new()),
            ctx: SessionContext::new(ProfileId::random()),
            crossword_id,
        }
    }

    fn params(&self) -> SessionParams {
        SessionParams::new(Topic::Scrum, Difficulty::Easy, self.crossword_id)
    }

    async fn session(&self) -> Result<PuzzleSession, SessionError> {
        let deps = SessionDeps::new(
            &Storage::from_in_memory(&self.repo),
            self.cache.clone(),
            Clock::fixed(fixed_now()),
        );
        let session =
            PuzzleSession::bootstrap(deps, self.ctx, self.params(), &SessionConfig::default())
                .await?;
        Ok(session.with_rng(StdRng::seed_from_u64(7)))
    }

    fn patches(&self) -> Vec<ProgressPatch> {
        self.repo
            .patch_log()
            .unwrap()
            .into_iter()
            .map(|(_, patch)| patch)
            .collect()
    }

    fn saved_answers(&self) -> Vec<String> {
        self.repo
            .recorded_writes()
            .unwrap()
            .into_iter()
            .filter_map(|w| match w {
                RecordedWrite::Answers { answers, .. } => Some(answers),
                RecordedWrite::Update { .. } => None,
            })
            .collect()
    }

    fn seed_progress(&self, time_spent_secs: u32, answers: Option<&str>) {
        self.repo
            .put_progress(ProgressRecord {
                id: ProgressId::new(41),
                crossword_id: self.crossword_id,
                profile_id: self.ctx.profile_id(),
                current_answers: answers.map(ToString::to_string),
                time_spent_secs,
                completed: false,
                failed: false,
                created_at: fixed_now(),
                last_accessed: None,
            })
            .unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn timed_session_expires_once_and_clamps_elapsed_time() {
    let fx = Fixture::new(10).await;
    let handle = SessionRunner::spawn(fx.session().await.unwrap(), SessionConfig::default());

    tokio::time::sleep(Duration::from_secs(30)).await;
    let view = handle.view();
    assert_eq!(view.elapsed_secs, 10);
    assert_eq!(view.time_remaining_secs, 0);
    assert!(view.time_expired);
    assert!(view.dialog().is_some());
    handle.shutdown().await;

    let patches = fx.patches();
    assert_eq!(
        patches,
        vec![ProgressPatch::time_spent(5), ProgressPatch::expired(10)]
    );
    assert_eq!(
        patches.iter().filter(|p| p.failed == Some(true)).count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn untimed_session_never_writes_elapsed_time() {
    let fx = Fixture::new(0).await;
    let handle = SessionRunner::spawn(fx.session().await.unwrap(), SessionConfig::default());

    tokio::time::sleep(Duration::from_secs(3600)).await;
    let view = handle.view();
    assert_eq!(view.elapsed_secs, 0);
    assert!(!view.time_expired);
    assert!(!view.is_timed());
    handle.shutdown().await;

    assert!(fx.patches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn guesses_are_saved_after_the_quiet_period() {
    let fx = Fixture::new(0).await;
    let handle = SessionRunner::spawn(fx.session().await.unwrap(), SessionConfig::default());

    handle.guess(CellKey::new(0, 0), 's').await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    handle.guess(CellKey::new(0, 1), 'P').await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(fx.saved_answers().is_empty());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let saved = fx.saved_answers();
    assert_eq!(saved.len(), 1);
    let snapshot = GuessSnapshot::parse(&saved[0]).unwrap();
    assert_eq!(snapshot.letter_at(CellKey::new(0, 0)), Some("S"));
    assert_eq!(snapshot.letter_at(CellKey::new(0, 1)), Some("P"));

    handle.shutdown().await;
    assert_eq!(fx.saved_answers().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_flushes_unsaved_guesses() {
    let fx = Fixture::new(0).await;
    let handle = SessionRunner::spawn(fx.session().await.unwrap(), SessionConfig::default());

    handle.guess(CellKey::new(2, 0), 'r').await.unwrap();
    handle.shutdown().await;

    let saved = fx.saved_answers();
    assert_eq!(saved.len(), 1);
    let snapshot = GuessSnapshot::parse(&saved[0]).unwrap();
    assert_eq!(snapshot.letter_at(CellKey::new(2, 0)), Some("R"));
}

#[tokio::test]
async fn hints_count_usages_from_earlier_visits() {
    let fx = Fixture::new(0).await;
    for _ in 0..2 {
        fx.repo
            .insert_used_clue(fx.crossword_id, fx.ctx.profile_id(), fixed_now())
            .await
            .unwrap();
    }

    let mut session = fx.session().await.unwrap();
    assert_eq!(session.hints().used(), 2);

    let outcome = session.reveal_hint().await.unwrap();
    let HintOutcome::Revealed {
        cell,
        letter,
        recorded,
        solved,
    } = outcome.clone()
    else {
        panic!("expected a revealed cell, got {outcome:?}");
    };
    assert!(recorded);
    assert!(!solved);
    assert!(SOLUTION.contains(&(cell.row, cell.col, letter)));
    assert_eq!(session.board().guess_at(cell), Some(letter));
    assert_eq!(session.hints().used(), 3);
    assert!(session.view().no_hints_left);

    assert!(matches!(
        session.reveal_hint().await,
        Err(SessionError::NoHintsLeft)
    ));
    let stored = fx
        .repo
        .list_used_clues(fx.crossword_id, fx.ctx.profile_id())
        .await
        .unwrap();
    assert_eq!(stored.len(), 3);
    session.shutdown().await;
}

#[tokio::test]
async fn solved_board_needs_no_hint() {
    let fx = Fixture::new(0).await;
    let answers = GuessSnapshot::new(
        0,
        SOLUTION
            .iter()
            .map(|(row, col, letter)| (CellKey::new(*row, *col), letter.to_string()))
            .collect(),
    )
    .to_json()
    .unwrap();
    fx.seed_progress(0, Some(&answers));

    let mut session = fx.session().await.unwrap();
    assert_eq!(
        session.reveal_hint().await.unwrap(),
        HintOutcome::NothingToReveal
    );
    assert_eq!(session.hints().used(), 0);
    session.shutdown().await;
}

#[tokio::test]
async fn completion_is_written_once() {
    let fx = Fixture::new(120).await;
    let mut session = fx.session().await.unwrap();

    let mut solved = Vec::new();
    for (row, col, letter) in SOLUTION {
        solved.push(
            session
                .apply_guess(CellKey::new(row, col), Some(letter))
                .unwrap()
                .solved,
        );
    }
    assert_eq!(solved.iter().filter(|s| **s).count(), 1);
    assert_eq!(solved.last(), Some(&true));
    assert!(!session.on_crossword_correct());
    assert!(matches!(
        session.apply_guess(CellKey::new(0, 0), Some('X')),
        Err(SessionError::Finished)
    ));
    assert!(!session.display_timer_active());
    assert!(!session.persist_timer_active());
    assert_eq!(fx.cache.get(session.cache_key()).unwrap(), None);

    session.shutdown().await;
    let completed: Vec<_> = fx
        .patches()
        .into_iter()
        .filter(|p| p.completed == Some(true))
        .collect();
    assert_eq!(completed, vec![ProgressPatch::completed()]);
}

#[tokio::test]
async fn restart_starts_a_fresh_attempt() {
    let fx = Fixture::new(60).await;
    let mut session = fx.session().await.unwrap();
    let first = session.progress_id().unwrap();

    session
        .apply_guess(CellKey::new(0, 0), Some('S'))
        .unwrap();
    for _ in 0..7 {
        session.tick_display();
    }
    session.tick_persist();
    session.reveal_hint().await.unwrap();
    assert_eq!(session.timers().display(), 7);

    session.restart().await.unwrap();
    let second = session.progress_id().unwrap();
    assert_ne!(first, second);
    assert_eq!(session.timers().display(), 0);
    assert_eq!(session.timers().persisted(), 0);
    assert_eq!(session.hints().used(), 0);
    assert_eq!(session.board().guess_at(CellKey::new(0, 0)), None);
    assert!(session.display_timer_active());

    let latest = fx
        .repo
        .find_latest(fx.crossword_id, fx.ctx.profile_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, second);
    assert_eq!(latest.time_spent_secs, 0);
    assert!(
        fx.repo
            .list_used_clues(fx.crossword_id, fx.ctx.profile_id())
            .await
            .unwrap()
            .is_empty()
    );
    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn restart_through_the_runner_rearms_the_timers() {
    let fx = Fixture::new(10).await;
    let handle = SessionRunner::spawn(fx.session().await.unwrap(), SessionConfig::default());

    tokio::time::sleep(Duration::from_secs(12)).await;
    assert!(handle.view().time_expired);
    let before = handle.view().progress_id;

    handle.restart().await.unwrap();
    let view = handle.view();
    assert_ne!(view.progress_id, before);
    assert_eq!(view.elapsed_secs, 0);
    assert!(!view.time_expired);

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(handle.view().elapsed_secs, 3);
    handle.shutdown().await;
}

#[tokio::test]
async fn resumed_attempt_restores_board_and_elapsed_time() {
    let fx = Fixture::new(120).await;
    fx.seed_progress(40, Some(r#"{"date":5,"guesses":{"0_0":"S","0_1":"Q"}}"#));

    let session = fx.session().await.unwrap();
    let view = session.view();
    assert_eq!(view.elapsed_secs, 40);
    assert_eq!(view.time_remaining_label(), "00:01:20");
    assert!(view.valid_guesses);
    assert_eq!(session.board().guess_at(CellKey::new(0, 1)), Some('Q'));
    assert!(fx.cache.get(session.cache_key()).unwrap().is_some());
    session.shutdown().await;
}

#[tokio::test]
async fn unreadable_answers_leave_an_empty_board() {
    let fx = Fixture::new(120).await;
    fx.seed_progress(10, Some("not a snapshot"));

    let session = fx.session().await.unwrap();
    assert!(!session.view().valid_guesses);
    assert_eq!(session.board().guess_at(CellKey::new(0, 0)), None);
    assert_eq!(fx.cache.get(session.cache_key()).unwrap(), None);
    session.shutdown().await;
}

#[tokio::test]
async fn stored_time_at_the_limit_loads_as_expired() {
    let fx = Fixture::new(30).await;
    fx.seed_progress(30, None);

    let mut session = fx.session().await.unwrap();
    let view = session.view();
    assert!(view.time_expired);
    assert_eq!(view.time_remaining_secs, 0);
    assert!(!session.display_timer_active());
    assert!(matches!(
        session.apply_guess(CellKey::new(0, 0), Some('S')),
        Err(SessionError::Finished)
    ));
    session.shutdown().await;
}

#[tokio::test]
async fn unknown_crossword_is_not_found() {
    let fx = Fixture::new(30).await;
    let deps = SessionDeps::new(
        &Storage::from_in_memory(&fx.repo),
        fx.cache.clone(),
        Clock::fixed(fixed_now()),
    );
    let params = SessionParams::new(Topic::Pmbok, Difficulty::Easy, fx.crossword_id);
    let result = PuzzleSession::bootstrap(deps, fx.ctx, params, &SessionConfig::default()).await;
    assert!(matches!(
        result,
        Err(SessionError::CrosswordNotFound(id)) if id == fx.crossword_id
    ));
}
