use chrono::{DateTime, Utc};
use crossword_core::model::{Difficulty, LearningProgress, ProfileId, Topic};

use super::SqliteRepository;
use super::mapping::{conn, map_learning_row};
use crate::repository::{LearningProgressRepository, StorageError};

#[async_trait::async_trait]
impl LearningProgressRepository for SqliteRepository {
    async fn find_learning_progress(
        &self,
        profile_id: ProfileId,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Result<Option<LearningProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, topic, difficulty, created_at
            FROM learning_progress
            WHERE user_id = ?1 AND topic = ?2 AND difficulty = ?3
            ",
        )
        .bind(profile_id.to_string())
        .bind(topic.as_str())
        .bind(difficulty.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_learning_row).transpose()
    }

    async fn insert_learning_progress(
        &self,
        profile_id: ProfileId,
        topic: Topic,
        difficulty: Difficulty,
        created_at: DateTime<Utc>,
    ) -> Result<LearningProgress, StorageError> {
        sqlx::query(
            r"
            INSERT INTO learning_progress (user_id, topic, difficulty, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, topic, difficulty) DO NOTHING
            ",
        )
        .bind(profile_id.to_string())
        .bind(topic.as_str())
        .bind(difficulty.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        self.find_learning_progress(profile_id, topic, difficulty)
            .await?
            .ok_or(StorageError::NotFound)
    }
}
