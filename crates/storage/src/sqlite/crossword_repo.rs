use chrono::{DateTime, Utc};
use crossword_core::model::{Crossword, CrosswordId, Difficulty, NewCrossword, Topic};

use super::SqliteRepository;
use super::mapping::{
    conn, crossword_id_from_i64, id_to_i64, map_crossword_row, ser, time_spent_to_text,
};
use crate::repository::{CrosswordRepository, StorageError};

#[async_trait::async_trait]
impl CrosswordRepository for SqliteRepository {
    async fn insert_crossword(
        &self,
        crossword: &NewCrossword,
        created_at: DateTime<Utc>,
    ) -> Result<CrosswordId, StorageError> {
        let data = serde_json::to_string(&crossword.definition).map_err(ser)?;

        let res = sqlx::query(
            r"
            INSERT INTO crosswords (title, description, topic, difficulty, time_limit, data, created_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(crossword.title.as_str())
        .bind(crossword.description.as_str())
        .bind(crossword.topic.as_str())
        .bind(crossword.difficulty.as_str())
        .bind(time_spent_to_text(crossword.time_limit_secs))
        .bind(data)
        .bind(crossword.created_by.map(|p| p.to_string()))
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        crossword_id_from_i64(res.last_insert_rowid())
    }

    async fn find_crossword(
        &self,
        id: CrosswordId,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Result<Option<Crossword>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, topic, difficulty, time_limit, data, created_by, created_at
            FROM crosswords
            WHERE id = ?1 AND topic = ?2 AND difficulty = ?3
            ",
        )
        .bind(id_to_i64("crossword_id", id.value())?)
        .bind(topic.as_str())
        .bind(difficulty.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_crossword_row).transpose()
    }

    async fn list_crosswords(
        &self,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Result<Vec<Crossword>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, topic, difficulty, time_limit, data, created_by, created_at
            FROM crosswords
            WHERE topic = ?1 AND difficulty = ?2
            ORDER BY id ASC
            ",
        )
        .bind(topic.as_str())
        .bind(difficulty.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_crossword_row(&row)?);
        }
        Ok(out)
    }
}
