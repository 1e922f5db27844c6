use chrono::{DateTime, Utc};
use crossword_core::model::{ClueUsage, ClueUsageId, CrosswordId, ProfileId};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_clue_usage_row, ser};
use crate::repository::{ClueUsageRepository, StorageError};

#[async_trait::async_trait]
impl ClueUsageRepository for SqliteRepository {
    async fn list_used_clues(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
    ) -> Result<Vec<ClueUsage>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, crossword_id, user_id, used_at
            FROM user_used_clues
            WHERE crossword_id = ?1 AND user_id = ?2
            ORDER BY id ASC
            ",
        )
        .bind(id_to_i64("crossword_id", crossword_id.value())?)
        .bind(profile_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_clue_usage_row(&row)?);
        }
        Ok(out)
    }

    async fn insert_used_clue(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
        used_at: DateTime<Utc>,
    ) -> Result<ClueUsage, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO user_used_clues (crossword_id, user_id, used_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(id_to_i64("crossword_id", crossword_id.value())?)
        .bind(profile_id.to_string())
        .bind(used_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let id = u64::try_from(res.last_insert_rowid()).map_err(ser)?;
        Ok(ClueUsage {
            id: ClueUsageId::new(id),
            crossword_id,
            profile_id,
            used_at,
        })
    }

    async fn delete_used_clues(
        &self,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
    ) -> Result<u64, StorageError> {
        let res = sqlx::query("DELETE FROM user_used_clues WHERE crossword_id = ?1 AND user_id = ?2")
            .bind(id_to_i64("crossword_id", crossword_id.value())?)
            .bind(profile_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected())
    }
}
