use chrono::{DateTime, Utc};

use crate::model::guesses::{GuessError, GuessSnapshot};
use crate::model::ids::{CrosswordId, ProfileId, ProgressId};

/// Persisted per-profile, per-crossword play state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub id: ProgressId,
    pub crossword_id: CrosswordId,
    pub profile_id: ProfileId,
    /// Serialized [`GuessSnapshot`]; opaque to everything but the board.
    pub current_answers: Option<String>,
    pub time_spent_secs: u32,
    pub completed: bool,
    pub failed: bool,
    pub created_at: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Both terminal flags set at once. Nothing writes this combination on
    /// purpose, but concurrent writers can produce it.
    #[must_use]
    pub fn has_conflicting_flags(&self) -> bool {
        self.completed && self.failed
    }

    /// Parses `current_answers`.
    ///
    /// `Ok(None)` when nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns `GuessError` when the stored text is not a recognizable snapshot.
    pub fn guesses(&self) -> Result<Option<GuessSnapshot>, GuessError> {
        match self.current_answers.as_deref() {
            None => Ok(None),
            Some(raw) => GuessSnapshot::parse_json(raw).map(Some),
        }
    }
}

/// Field-subset update of a progress row. `None` leaves the column untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressPatch {
    pub time_spent_secs: Option<u32>,
    pub completed: Option<bool>,
    pub failed: Option<bool>,
}

impl ProgressPatch {
    /// Periodic elapsed-time flush.
    #[must_use]
    pub fn time_spent(secs: u32) -> Self {
        Self {
            time_spent_secs: Some(secs),
            ..Self::default()
        }
    }

    /// Time ran out: clamp elapsed time to the limit and mark the attempt failed.
    #[must_use]
    pub fn expired(time_limit_secs: u32) -> Self {
        Self {
            time_spent_secs: Some(time_limit_secs),
            completed: Some(false),
            failed: Some(true),
        }
    }

    /// Every cell verified correct.
    #[must_use]
    pub fn completed() -> Self {
        Self {
            time_spent_secs: None,
            completed: Some(true),
            failed: Some(false),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time_spent_secs.is_none() && self.completed.is_none() && self.failed.is_none()
    }

    /// Applies the patch to an in-memory record.
    pub fn apply_to(&self, record: &mut ProgressRecord) {
        if let Some(secs) = self.time_spent_secs {
            record.time_spent_secs = secs;
        }
        if let Some(completed) = self.completed {
            record.completed = completed;
        }
        if let Some(failed) = self.failed {
            record.failed = failed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn record(answers: Option<&str>) -> ProgressRecord {
        ProgressRecord {
            id: ProgressId::new(1),
            crossword_id: CrosswordId::new(2),
            profile_id: ProfileId::random(),
            current_answers: answers.map(str::to_string),
            time_spent_secs: 0,
            completed: false,
            failed: false,
            created_at: fixed_now(),
            last_accessed: None,
        }
    }

    #[test]
    fn guesses_distinguish_missing_from_malformed() {
        assert_eq!(record(None).guesses(), Ok(None));
        assert!(record(Some(r#"{"guesses":{}}"#)).guesses().unwrap().is_some());
        assert_eq!(record(Some("[1,2]")).guesses(), Err(GuessError::MissingGuesses));
    }

    #[test]
    fn terminal_patches_keep_flags_exclusive() {
        let mut r = record(None);
        ProgressPatch::expired(60).apply_to(&mut r);
        assert!(r.failed && !r.completed);
        assert_eq!(r.time_spent_secs, 60);

        ProgressPatch::completed().apply_to(&mut r);
        assert!(r.completed && !r.failed);
        assert!(!r.has_conflicting_flags());
        assert_eq!(r.time_spent_secs, 60);
    }

    #[test]
    fn time_patch_touches_only_time() {
        let patch = ProgressPatch::time_spent(15);
        assert_eq!(patch.completed, None);
        assert_eq!(patch.failed, None);
        assert!(!patch.is_empty());
        assert!(ProgressPatch::default().is_empty());
    }
}
