use crossword_core::model::{Profile, ProfileId};

use super::SqliteRepository;
use super::mapping::{conn, map_profile_row};
use crate::repository::{ProfileRepository, StorageError};

#[async_trait::async_trait]
impl ProfileRepository for SqliteRepository {
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO profiles (id, username, role)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                role = excluded.role
            ",
        )
        .bind(profile.id().to_string())
        .bind(profile.username())
        .bind(profile.role().map(|r| r.as_str()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>, StorageError> {
        let row = sqlx::query("SELECT id, username, role FROM profiles WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_profile_row).transpose()
    }
}
