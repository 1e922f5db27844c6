use std::sync::Arc;

use crossword_core::Clock;
use crossword_core::model::{
    CrosswordBoard, CrosswordDraft, CrosswordId, GuessSnapshot, NewCrossword, Permission, Profile,
    PuzzleBoard,
};
use storage::repository::{CrosswordRepository, Storage};
use tracing::info;

use crate::error::AuthoringError;

/// A validated draft together with its solved grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrosswordPreview {
    pub crossword: NewCrossword,
    pub grid_size: u32,
    pub solution: GuessSnapshot,
}

/// Builds and publishes new crosswords.
#[derive(Clone)]
pub struct AuthoringService {
    clock: Clock,
    crosswords: Arc<dyn CrosswordRepository>,
}

impl AuthoringService {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock) -> Self {
        Self {
            clock,
            crosswords: Arc::clone(&storage.crosswords),
        }
    }

    /// Validate a draft and fill its grid.
    ///
    /// # Errors
    ///
    /// Returns `AuthoringError::Draft` for invalid drafts.
    pub fn preview(&self, draft: CrosswordDraft) -> Result<CrosswordPreview, AuthoringError> {
        let crossword = draft.validate(None)?;
        Self::build_preview(crossword, self.clock.now().timestamp_millis())
    }

    fn build_preview(
        crossword: NewCrossword,
        taken_at_ms: i64,
    ) -> Result<CrosswordPreview, AuthoringError> {
        let mut board = CrosswordBoard::from_definition(&crossword.definition)?;
        board.fill_all_answers();
        Ok(CrosswordPreview {
            grid_size: crossword.definition.grid_size(),
            solution: board.snapshot(taken_at_ms),
            crossword,
        })
    }

    /// Validate and store a draft on behalf of `author`.
    ///
    /// # Errors
    ///
    /// Returns `AuthoringError::Forbidden` unless the author may create
    /// crosswords, `AuthoringError::Draft` for invalid drafts and
    /// `AuthoringError::Storage` if the insert fails.
    pub async fn publish(
        &self,
        author: &Profile,
        draft: CrosswordDraft,
    ) -> Result<CrosswordId, AuthoringError> {
        if !author.can(Permission::CreateCrosswords) {
            return Err(AuthoringError::Forbidden);
        }
        let crossword = draft.validate(Some(author.id()))?;
        let id = self
            .crosswords
            .insert_crossword(&crossword, self.clock.now())
            .await?;
        info!(
            crossword_id = %id,
            topic = %crossword.topic,
            difficulty = %crossword.difficulty,
            "crossword published"
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossword_core::model::{AppRole, CellKey, ClueEntry, Difficulty, ProfileId, Topic};
    use crossword_core::time::fixed_clock;

    fn draft() -> CrosswordDraft {
        CrosswordDraft {
            title: "Roles".into(),
            description: "Who does what".into(),
            topic: Topic::Scrum,
            difficulty: Difficulty::Easy,
            time_limit: "00:02:00".into(),
            across: vec![ClueEntry::new("Owns the backlog", "po", 0, 0)],
            down: vec![ClueEntry::new("Timebox", "period", 0, 0)],
        }
    }

    #[test]
    fn preview_fills_the_grid() {
        let service = AuthoringService::new(&Storage::in_memory(), fixed_clock());
        let preview = service.preview(draft()).unwrap();
        assert_eq!(preview.grid_size, 6);
        assert_eq!(preview.solution.letter_at(CellKey::new(0, 1)), Some("O"));
        assert_eq!(preview.solution.letter_at(CellKey::new(5, 0)), Some("D"));
    }

    #[tokio::test]
    async fn only_admins_publish() {
        let storage = Storage::in_memory();
        let service = AuthoringService::new(&storage, fixed_clock());
        let player = Profile::new(ProfileId::random(), None, None);
        assert!(matches!(
            service.publish(&player, draft()).await,
            Err(AuthoringError::Forbidden)
        ));

        let admin = Profile::new(ProfileId::random(), None, Some(AppRole::Admin));
        let id = service.publish(&admin, draft()).await.unwrap();
        let stored = storage
            .crosswords
            .find_crossword(id, Topic::Scrum, Difficulty::Easy)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.time_limit_secs(), 120);
        assert_eq!(stored.created_by(), Some(admin.id()));
        assert_eq!(stored.definition().across[&1].answer, "PO");
    }
}
