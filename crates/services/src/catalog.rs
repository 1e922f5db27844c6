use std::sync::Arc;

use crossword_core::Clock;
use crossword_core::model::{CrosswordId, Difficulty, LearningProgress, SessionContext, Topic};
use storage::repository::{
    CrosswordRepository, LearningProgressRepository, ProgressRepository, Storage,
};
use tracing::info;

use crate::error::CatalogError;

/// How far a profile got with one crossword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStatus {
    NotStarted,
    InProgress { time_spent_secs: u32 },
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelEntry {
    pub id: CrosswordId,
    pub title: String,
    pub description: Option<String>,
    pub time_limit_secs: u32,
    pub status: LevelStatus,
}

/// One level menu: the crosswords of a topic and difficulty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelMenu {
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub tutorial_completed: bool,
    pub levels: Vec<LevelEntry>,
    pub easier: Option<Difficulty>,
    pub harder: Option<Difficulty>,
}

/// Where opening a level leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelAccess {
    Tutorial,
    /// The tutorial of this topic and difficulty has not been read yet.
    Locked,
    Play(CrosswordId),
}

/// Level menu and tutorial gating.
#[derive(Clone)]
pub struct CatalogService {
    clock: Clock,
    crosswords: Arc<dyn CrosswordRepository>,
    progress: Arc<dyn ProgressRepository>,
    learning: Arc<dyn LearningProgressRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock) -> Self {
        Self {
            clock,
            crosswords: Arc::clone(&storage.crosswords),
            progress: Arc::clone(&storage.progress),
            learning: Arc::clone(&storage.learning),
        }
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if any lookup fails.
    pub async fn tutorial_completed(
        &self,
        ctx: SessionContext,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Result<bool, CatalogError> {
        Ok(self
            .learning
            .find_learning_progress(ctx.profile_id(), topic, difficulty)
            .await?
            .is_some())
    }

    /// List the crosswords of a level with the profile's status on each.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if any lookup fails.
    pub async fn levels(
        &self,
        ctx: SessionContext,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Result<LevelMenu, CatalogError> {
        let crosswords = self.crosswords.list_crosswords(topic, difficulty).await?;
        let mut levels = Vec::with_capacity(crosswords.len());
        for crossword in crosswords {
            let status = match self
                .progress
                .find_latest(crossword.id(), ctx.profile_id())
                .await?
            {
                None => LevelStatus::NotStarted,
                Some(r) if r.completed => LevelStatus::Completed,
                Some(r) if r.failed => LevelStatus::Failed,
                Some(r) => LevelStatus::InProgress {
                    time_spent_secs: r.time_spent_secs,
                },
            };
            levels.push(LevelEntry {
                id: crossword.id(),
                title: crossword.title().to_string(),
                description: crossword.description().map(ToString::to_string),
                time_limit_secs: crossword.time_limit_secs(),
                status,
            });
        }

        Ok(LevelMenu {
            topic,
            difficulty,
            tutorial_completed: self.tutorial_completed(ctx, topic, difficulty).await?,
            levels,
            easier: difficulty.prev(),
            harder: difficulty.next(),
        })
    }

    /// Decide where a level link leads. Without a crossword id the link is
    /// the tutorial itself; crosswords stay locked until it was read.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the tutorial lookup fails.
    pub async fn open_level(
        &self,
        ctx: SessionContext,
        topic: Topic,
        difficulty: Difficulty,
        crossword_id: Option<CrosswordId>,
    ) -> Result<LevelAccess, CatalogError> {
        let Some(id) = crossword_id else {
            return Ok(LevelAccess::Tutorial);
        };
        if self.tutorial_completed(ctx, topic, difficulty).await? {
            Ok(LevelAccess::Play(id))
        } else {
            Ok(LevelAccess::Locked)
        }
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the row cannot be stored.
    pub async fn complete_tutorial(
        &self,
        ctx: SessionContext,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Result<LearningProgress, CatalogError> {
        let row = self
            .learning
            .insert_learning_progress(ctx.profile_id(), topic, difficulty, self.clock.now())
            .await?;
        info!(profile_id = %ctx.profile_id(), %topic, %difficulty, "tutorial completed");
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossword_core::model::{ClueEntry, CluesInput, NewCrossword, ProfileId, ProgressPatch};
    use crossword_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn new_crossword(title: &str) -> NewCrossword {
        let mut definition = CluesInput::default();
        definition
            .across
            .insert(1, ClueEntry::new("Daily event", "STANDUP", 0, 0));
        NewCrossword {
            title: title.into(),
            description: "d".into(),
            topic: Topic::Scrum,
            difficulty: Difficulty::Medium,
            time_limit_secs: 120,
            definition,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn levels_report_latest_progress_per_crossword() {
        let repo = InMemoryRepository::new();
        let storage = Storage::from_in_memory(&repo);
        let catalog = CatalogService::new(&storage, fixed_clock());
        let ctx = SessionContext::new(ProfileId::random());

        let fresh = storage
            .crosswords
            .insert_crossword(&new_crossword("one"), fixed_now())
            .await
            .unwrap();
        let started = storage
            .crosswords
            .insert_crossword(&new_crossword("two"), fixed_now())
            .await
            .unwrap();
        let done = storage
            .crosswords
            .insert_crossword(&new_crossword("three"), fixed_now())
            .await
            .unwrap();

        let id = storage
            .progress
            .create_default(started, ctx.profile_id(), fixed_now())
            .await
            .unwrap();
        storage
            .progress
            .update_progress(id, ProgressPatch::time_spent(30), fixed_now())
            .await
            .unwrap();
        let id = storage
            .progress
            .create_default(done, ctx.profile_id(), fixed_now())
            .await
            .unwrap();
        storage
            .progress
            .update_progress(id, ProgressPatch::completed(), fixed_now())
            .await
            .unwrap();

        let menu = catalog
            .levels(ctx, Topic::Scrum, Difficulty::Medium)
            .await
            .unwrap();
        let statuses: Vec<_> = menu.levels.iter().map(|l| (l.id, l.status)).collect();
        assert_eq!(
            statuses,
            vec![
                (fresh, LevelStatus::NotStarted),
                (started, LevelStatus::InProgress { time_spent_secs: 30 }),
                (done, LevelStatus::Completed),
            ]
        );
        assert_eq!(menu.easier, Some(Difficulty::Easy));
        assert_eq!(menu.harder, Some(Difficulty::Hard));
        assert!(!menu.tutorial_completed);
    }

    #[tokio::test]
    async fn levels_unlock_after_tutorial() {
        let storage = Storage::in_memory();
        let catalog = CatalogService::new(&storage, fixed_clock());
        let ctx = SessionContext::new(ProfileId::random());
        let id = CrosswordId::new(1);

        let access = catalog
            .open_level(ctx, Topic::Pmbok, Difficulty::Easy, None)
            .await
            .unwrap();
        assert_eq!(access, LevelAccess::Tutorial);
        let access = catalog
            .open_level(ctx, Topic::Pmbok, Difficulty::Easy, Some(id))
            .await
            .unwrap();
        assert_eq!(access, LevelAccess::Locked);

        catalog
            .complete_tutorial(ctx, Topic::Pmbok, Difficulty::Easy)
            .await
            .unwrap();
        let access = catalog
            .open_level(ctx, Topic::Pmbok, Difficulty::Easy, Some(id))
            .await
            .unwrap();
        assert_eq!(access, LevelAccess::Play(id));

        let other = catalog
            .open_level(ctx, Topic::Pmbok, Difficulty::Hard, Some(id))
            .await
            .unwrap();
        assert_eq!(other, LevelAccess::Locked);
    }
}
