use anyhow::{Context, Result};
use crossword_core::Clock;
use crossword_core::model::{AppRole, ClueEntry, CrosswordDraft, Difficulty, Profile, Topic};
use storage::repository::{CrosswordRepository, ProfileRepository, Storage};
use tracing::info;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

fn draft(
    title: &str,
    description: &str,
    topic: Topic,
    difficulty: Difficulty,
    time_limit: &str,
    across: &[(&str, &str, u32, u32)],
    down: &[(&str, &str, u32, u32)],
) -> CrosswordDraft {
    fn clues(list: &[(&str, &str, u32, u32)]) -> Vec<ClueEntry> {
        list.iter()
            .map(|(clue, answer, row, col)| ClueEntry::new(*clue, *answer, *row, *col))
            .collect()
    }
    CrosswordDraft {
        title: title.into(),
        description: description.into(),
        topic,
        difficulty,
        time_limit: time_limit.into(),
        across: clues(across),
        down: clues(down),
    }
}

/// Built-in puzzles covering both topics, timed and untimed.
#[must_use]
pub fn sample_drafts() -> Vec<CrosswordDraft> {
    vec![
        draft(
            "Scrum roles",
            "Who does what in a Scrum team",
            Topic::Scrum,
            Difficulty::Easy,
            "00:05:00",
            &[
                ("Timeboxed iteration", "SPRINT", 0, 0),
                ("Scrum ___, servant leader of the team", "MASTER", 4, 0),
            ],
            &[
                ("Framework for complex product work", "SCRUM", 0, 0),
                ("Self-managing group of professionals", "TEAM", 0, 5),
            ],
        ),
        draft(
            "Scrum events",
            "The rhythm of a sprint",
            Topic::Scrum,
            Difficulty::Medium,
            "00:03:00",
            &[
                ("Sprint ___, inspection of the increment", "REVIEW", 0, 0),
                ("Fixed maximum duration of an event", "TIMEBOX", 2, 0),
            ],
            &[("Short name of the last event of a sprint", "RETRO", 0, 0)],
        ),
        draft(
            "Project basics",
            "Core planning vocabulary",
            Topic::Pmbok,
            Difficulty::Easy,
            "00:00:00",
            &[
                ("Work the project must deliver", "SCOPE", 0, 0),
                ("Forecast of cost or duration", "ESTIMATE", 7, 0),
            ],
            &[
                ("Planned dates for activities", "SCHEDULE", 0, 0),
                ("Person-hours needed for a task", "EFFORT", 0, 4),
            ],
        ),
        draft(
            "Risk and governance",
            "Authorization and uncertainty",
            Topic::Pmbok,
            Difficulty::Hard,
            "00:02:00",
            &[
                ("Uncertain event with an effect on objectives", "RISK", 0, 0),
                ("Document that authorizes a project", "CHARTER", 2, 0),
            ],
            &[
                ("Responsibility assignment matrix", "RACI", 0, 0),
                ("Return on investment, abbreviated", "ROI", 2, 6),
            ],
        ),
    ]
}

/// Insert the sample puzzles that are not stored yet, matched by title
/// within their topic and difficulty. With `admin` the profile is granted
/// the admin role first.
pub async fn seed(
    storage: &Storage,
    clock: Clock,
    profile: &Profile,
    admin: bool,
) -> Result<SeedReport> {
    if admin {
        let promoted = Profile::new(
            profile.id(),
            profile.username().map(ToString::to_string),
            Some(AppRole::Admin),
        );
        storage.profiles.upsert_profile(&promoted).await?;
        info!(profile_id = %profile.id(), "granted admin role");
    }

    let mut report = SeedReport::default();
    for draft in sample_drafts() {
        let existing = storage
            .crosswords
            .list_crosswords(draft.topic, draft.difficulty)
            .await?;
        if existing.iter().any(|c| c.title() == draft.title) {
            report.skipped += 1;
            continue;
        }
        let title = draft.title.clone();
        let crossword = draft
            .validate(None)
            .with_context(|| format!("sample crossword '{title}' is invalid"))?;
        let id = storage
            .crosswords
            .insert_crossword(&crossword, clock.now())
            .await?;
        info!(crossword_id = %id, %title, "seeded crossword");
        report.inserted += 1;
    }
    Ok(report)
}
