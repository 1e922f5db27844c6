use chrono::{DateTime, Utc};
use crossword_core::model::{CrosswordId, ProfileId, ProgressId, ProgressPatch, ProgressRecord};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_progress_row, progress_id_from_i64, time_spent_to_text};
use crate::repository::{ProgressRepository, StorageError};

const PROGRESS_COLUMNS: &str = "id, crossword_id, user_id, current_answers, time_spent, completed, failed, created_at, last_accessed";

impl SqliteRepository {
    async fn progress_by_id(&self, id: i64) -> Result<Option<ProgressRecord>, StorageError> {
        let sql = format!("SELECT {PROGRESS_COLUMNS} FROM user_progress WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_progress_row).transpose()
    }
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn find_latest(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM user_progress
             WHERE crossword_id = ?1 AND user_id = ?2
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(id_to_i64("crossword_id", crossword_id.value())?)
            .bind(profile_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_progress_row).transpose()
    }

    async fn create_default(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
        created_at: DateTime<Utc>,
    ) -> Result<ProgressId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO user_progress (crossword_id, user_id, time_spent, completed, failed, created_at)
            VALUES (?1, ?2, ?3, 0, 0, ?4)
            ",
        )
        .bind(id_to_i64("crossword_id", crossword_id.value())?)
        .bind(profile_id.to_string())
        .bind(time_spent_to_text(0))
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        progress_id_from_i64(res.last_insert_rowid())
    }

    async fn update_progress(
        &self,
        id: ProgressId,
        patch: ProgressPatch,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE user_progress SET
                time_spent = COALESCE(?2, time_spent),
                completed = COALESCE(?3, completed),
                failed = COALESCE(?4, failed),
                last_accessed = ?5
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("progress_id", id.value())?)
        .bind(patch.time_spent_secs.map(time_spent_to_text))
        .bind(patch.completed)
        .bind(patch.failed)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
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
        let id = id_to_i64("progress_id", id.value())?;
        sqlx::query(
            r"
            INSERT INTO user_progress (id, crossword_id, user_id, current_answers, time_spent, completed, failed, created_at, last_accessed)
            VALUES (?1, ?2, ?3, ?4, '00:00:00', 0, 0, ?5, ?5)
            ON CONFLICT(id) DO UPDATE SET
                current_answers = excluded.current_answers,
                last_accessed = excluded.last_accessed
            ",
        )
        .bind(id)
        .bind(id_to_i64("crossword_id", crossword_id.value())?)
        .bind(profile_id.to_string())
        .bind(answers)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        self.progress_by_id(id).await?.ok_or(StorageError::NotFound)
    }

    async fn delete_progress(&self, id: ProgressId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM user_progress WHERE id = ?1")
            .bind(id_to_i64("progress_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
