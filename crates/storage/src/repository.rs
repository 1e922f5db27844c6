use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crossword_core::model::{
    ClueUsage, ClueUsageId, Crossword, CrosswordId, Difficulty, LearningProgress,
    LearningProgressId, NewCrossword, Profile, ProfileId, ProgressId, ProgressPatch,
    ProgressRecord, Topic,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Read access to published puzzles plus the authoring insert.
#[async_trait]
pub trait CrosswordRepository: Send + Sync {
    /// Insert a validated crossword and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be stored.
    async fn insert_crossword(
        &self,
        crossword: &NewCrossword,
        created_at: DateTime<Utc>,
    ) -> Result<CrosswordId, StorageError>;

    /// Fetch a crossword by the route triple. A crossword filed under another
    /// topic or difficulty is reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn find_crossword(
        &self,
        id: CrosswordId,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Result<Option<Crossword>, StorageError>;

    /// List the crosswords of one level menu, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_crosswords(
        &self,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Result<Vec<Crossword>, StorageError>;
}

/// Remote progress rows. Several rows may exist per crossword and profile;
/// readers only ever look at the most recently created one.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Latest row for the pair, ordered by creation time descending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn find_latest(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// Insert a zeroed row (no answers, no time, no flags).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the insert fails.
    async fn create_default(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
        created_at: DateTime<Utc>,
    ) -> Result<ProgressId, StorageError>;

    /// Apply a field-subset update by id and stamp `last_accessed`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no row has this id.
    async fn update_progress(
        &self,
        id: ProgressId,
        patch: ProgressPatch,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Write `current_answers` by id, inserting a fresh row with that id when
    /// none exists. Returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn upsert_answers(
        &self,
        id: ProgressId,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
        answers: &str,
        at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails. Deleting a missing row is not an error.
    async fn delete_progress(&self, id: ProgressId) -> Result<(), StorageError>;
}

/// Append-only hint usage log.
#[async_trait]
pub trait ClueUsageRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_used_clues(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
    ) -> Result<Vec<ClueUsage>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the insert fails.
    async fn insert_used_clue(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
        used_at: DateTime<Utc>,
    ) -> Result<ClueUsage, StorageError>;

    /// Remove every usage row for the pair and return how many went.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn delete_used_clues(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
    ) -> Result<u64, StorageError>;
}

/// Tutorial completion per topic and difficulty.
#[async_trait]
pub trait LearningProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn find_learning_progress(
        &self,
        profile_id: ProfileId,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Result<Option<LearningProgress>, StorageError>;

    /// Record the tutorial as read. Recording it twice returns the first row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the insert fails.
    async fn insert_learning_progress(
        &self,
        profile_id: ProfileId,
        topic: Topic,
        difficulty: Difficulty,
        created_at: DateTime<Utc>,
    ) -> Result<LearningProgress, StorageError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Debug)]
struct Table<T> {
    next_id: u64,
    rows: BTreeMap<u64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn insert_with_id(&mut self, id: u64, row: T) {
        self.next_id = self.next_id.max(id + 1);
        self.rows.insert(id, row);
    }
}

/// A progress write observed by [`InMemoryRepository`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedWrite {
    Update { id: ProgressId, patch: ProgressPatch },
    Answers { id: ProgressId, answers: String },
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Ids are never reused, mirroring `AUTOINCREMENT` in the `SQLite` schema.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    crosswords: Arc<Mutex<Table<Crossword>>>,
    progress: Arc<Mutex<Table<ProgressRecord>>>,
    clue_usage: Arc<Mutex<Table<ClueUsage>>>,
    learning: Arc<Mutex<Table<LearningProgress>>>,
    profiles: Arc<Mutex<HashMap<ProfileId, Profile>>>,
    writes: Arc<Mutex<Vec<RecordedWrite>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every progress update and answers upsert received so far.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the log lock is poisoned.
    pub fn recorded_writes(&self) -> Result<Vec<RecordedWrite>, StorageError> {
        Ok(lock(&self.writes)?.clone())
    }

    /// Only the field-subset updates, in call order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the log lock is poisoned.
    pub fn patch_log(&self) -> Result<Vec<(ProgressId, ProgressPatch)>, StorageError> {
        Ok(lock(&self.writes)?
            .iter()
            .filter_map(|w| match w {
                RecordedWrite::Update { id, patch } => Some((*id, *patch)),
                RecordedWrite::Answers { .. } => None,
            })
            .collect())
    }

    /// Seed a progress row as-is, e.g. an attempt left over from a previous run.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the table lock is poisoned.
    pub fn put_progress(&self, record: ProgressRecord) -> Result<(), StorageError> {
        lock(&self.progress)?.insert_with_id(record.id.value(), record);
        Ok(())
    }
}

#[async_trait]
impl CrosswordRepository for InMemoryRepository {
    async fn insert_crossword(
        &self,
        crossword: &NewCrossword,
        created_at: DateTime<Utc>,
    ) -> Result<CrosswordId, StorageError> {
        let mut guard = lock(&self.crosswords)?;
        let id = CrosswordId::new(guard.allocate());
        let stored = Crossword::from_persisted(
            id,
            crossword.title.clone(),
            Some(crossword.description.clone()),
            crossword.topic,
            crossword.difficulty,
            crossword.time_limit_secs,
            crossword.definition.clone(),
            crossword.created_by,
            created_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.rows.insert(id.value(), stored);
        Ok(id)
    }

    async fn find_crossword(
        &self,
        id: CrosswordId,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Result<Option<Crossword>, StorageError> {
        let guard = lock(&self.crosswords)?;
        Ok(guard
            .rows
            .get(&id.value())
            .filter(|c| c.topic() == topic && c.difficulty() == difficulty)
            .cloned())
    }

    async fn list_crosswords(
        &self,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Result<Vec<Crossword>, StorageError> {
        let guard = lock(&self.crosswords)?;
        Ok(guard
            .rows
            .values()
            .filter(|c| c.topic() == topic && c.difficulty() == difficulty)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn find_latest(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = lock(&self.progress)?;
        Ok(guard
            .rows
            .values()
            .filter(|r| r.crossword_id == crossword_id && r.profile_id == profile_id)
            .max_by_key(|r| (r.created_at, r.id))
            .cloned())
    }

    async fn create_default(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
        created_at: DateTime<Utc>,
    ) -> Result<ProgressId, StorageError> {
        let mut guard = lock(&self.progress)?;
        let id = ProgressId::new(guard.allocate());
        guard.rows.insert(
            id.value(),
            ProgressRecord {
                id,
                crossword_id,
                profile_id,
                current_answers: None,
                time_spent_secs: 0,
                completed: false,
                failed: false,
                created_at,
                last_accessed: None,
            },
        );
        Ok(id)
    }

    async fn update_progress(
        &self,
        id: ProgressId,
        patch: ProgressPatch,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        lock(&self.writes)?.push(RecordedWrite::Update { id, patch });
        let mut guard = lock(&self.progress)?;
        let record = guard.rows.get_mut(&id.value()).ok_or(StorageError::NotFound)?;
        patch.apply_to(record);
        record.last_accessed = Some(at);
        Ok(())
    }

    async fn upsert_answers(
        &self,
        id: ProgressId,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
        answers: &str,
        at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError> {
        lock(&self.writes)?.push(RecordedWrite::Answers {
            id,
            answers: answers.to_string(),
        });
        let mut guard = lock(&self.progress)?;
        if let Some(record) = guard.rows.get_mut(&id.value()) {
            record.current_answers = Some(answers.to_string());
            record.last_accessed = Some(at);
            return Ok(record.clone());
        }
        let record = ProgressRecord {
            id,
            crossword_id,
            profile_id,
            current_answers: Some(answers.to_string()),
            time_spent_secs: 0,
            completed: false,
            failed: false,
            created_at: at,
            last_accessed: Some(at),
        };
        guard.insert_with_id(id.value(), record.clone());
        Ok(record)
    }

    async fn delete_progress(&self, id: ProgressId) -> Result<(), StorageError> {
        lock(&self.progress)?.rows.remove(&id.value());
        Ok(())
    }
}

#[async_trait]
impl ClueUsageRepository for InMemoryRepository {
    async fn list_used_clues(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
    ) -> Result<Vec<ClueUsage>, StorageError> {
        let guard = lock(&self.clue_usage)?;
        Ok(guard
            .rows
            .values()
            .filter(|u| u.crossword_id == crossword_id && u.profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn insert_used_clue(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
        used_at: DateTime<Utc>,
    ) -> Result<ClueUsage, StorageError> {
        let mut guard = lock(&self.clue_usage)?;
        let usage = ClueUsage {
            id: ClueUsageId::new(guard.allocate()),
            crossword_id,
            profile_id,
            used_at,
        };
        guard.rows.insert(usage.id.value(), usage.clone());
        Ok(usage)
    }

    async fn delete_used_clues(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
    ) -> Result<u64, StorageError> {
        let mut guard = lock(&self.clue_usage)?;
        let before = guard.rows.len();
        guard
            .rows
            .retain(|_, u| !(u.crossword_id == crossword_id && u.profile_id == profile_id));
        Ok((before - guard.rows.len()) as u64)
    }
}

#[async_trait]
impl LearningProgressRepository for InMemoryRepository {
    async fn find_learning_progress(
        &self,
        profile_id: ProfileId,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Result<Option<LearningProgress>, StorageError> {
        let guard = lock(&self.learning)?;
        Ok(guard
            .rows
            .values()
            .find(|l| l.profile_id == profile_id && l.topic == topic && l.difficulty == difficulty)
            .cloned())
    }

    async fn insert_learning_progress(
        &self,
        profile_id: ProfileId,
        topic: Topic,
        difficulty: Difficulty,
        created_at: DateTime<Utc>,
    ) -> Result<LearningProgress, StorageError> {
        let mut guard = lock(&self.learning)?;
        if let Some(existing) = guard
            .rows
            .values()
            .find(|l| l.profile_id == profile_id && l.topic == topic && l.difficulty == difficulty)
        {
            return Ok(existing.clone());
        }
        let row = LearningProgress {
            id: LearningProgressId::new(guard.allocate()),
            profile_id,
            topic,
            difficulty,
            created_at,
        };
        guard.rows.insert(row.id.value(), row.clone());
        Ok(row)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        lock(&self.profiles)?.insert(profile.id(), profile.clone());
        Ok(())
    }

    async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>, StorageError> {
        Ok(lock(&self.profiles)?.get(&id).cloned())
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub crosswords: Arc<dyn CrosswordRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub clue_usage: Arc<dyn ClueUsageRepository>,
    pub learning: Arc<dyn LearningProgressRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(&InMemoryRepository::new())
    }

    /// Share one in-memory backend, so tests can keep a handle for inspection.
    #[must_use]
    pub fn from_in_memory(repo: &InMemoryRepository) -> Self {
        Self {
            crosswords: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            clue_usage: Arc::new(repo.clone()),
            learning: Arc::new(repo.clone()),
            profiles: Arc::new(repo.clone()),
        }
    }
}
