use chrono::{DateTime, Utc};
use crossword_core::model::{
    AppRole, ClueUsage, ClueUsageId, CluesInput, Crossword, CrosswordId, Difficulty,
    LearningProgress, LearningProgressId, Profile, ProfileId, ProgressId, ProgressRecord, Topic,
};
use crossword_core::time::{interval_to_secs, secs_to_interval};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn crossword_id_from_i64(v: i64) -> Result<CrosswordId, StorageError> {
    Ok(CrosswordId::new(i64_to_u64("crossword_id", v)?))
}

pub(crate) fn progress_id_from_i64(v: i64) -> Result<ProgressId, StorageError> {
    Ok(ProgressId::new(i64_to_u64("progress_id", v)?))
}

pub(crate) fn profile_id_from_str(raw: &str) -> Result<ProfileId, StorageError> {
    raw.parse().map_err(ser)
}

/// Elapsed seconds are stored as `HH:MM:SS` text.
pub(crate) fn time_spent_to_text(secs: u32) -> String {
    secs_to_interval(secs)
}

pub(crate) fn time_spent_from_text(raw: &str) -> Result<u32, StorageError> {
    interval_to_secs(raw).map_err(ser)
}

pub(crate) fn map_crossword_row(row: &SqliteRow) -> Result<Crossword, StorageError> {
    let topic: Topic = row.try_get::<String, _>("topic").map_err(ser)?.parse().map_err(ser)?;
    let difficulty: Difficulty = row
        .try_get::<String, _>("difficulty")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let time_limit = time_spent_from_text(&row.try_get::<String, _>("time_limit").map_err(ser)?)?;
    let definition: CluesInput =
        serde_json::from_str(&row.try_get::<String, _>("data").map_err(ser)?).map_err(ser)?;
    let created_by = row
        .try_get::<Option<String>, _>("created_by")
        .map_err(ser)?
        .as_deref()
        .map(profile_id_from_str)
        .transpose()?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;

    Crossword::from_persisted(
        crossword_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        topic,
        difficulty,
        time_limit,
        definition,
        created_by,
        created_at,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    Ok(ProgressRecord {
        id: progress_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        crossword_id: crossword_id_from_i64(row.try_get::<i64, _>("crossword_id").map_err(ser)?)?,
        profile_id: profile_id_from_str(&row.try_get::<String, _>("user_id").map_err(ser)?)?,
        current_answers: row.try_get("current_answers").map_err(ser)?,
        time_spent_secs: time_spent_from_text(
            &row.try_get::<String, _>("time_spent").map_err(ser)?,
        )?,
        completed: row.try_get("completed").map_err(ser)?,
        failed: row.try_get("failed").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        last_accessed: row.try_get("last_accessed").map_err(ser)?,
    })
}

pub(crate) fn map_clue_usage_row(row: &SqliteRow) -> Result<ClueUsage, StorageError> {
    Ok(ClueUsage {
        id: ClueUsageId::new(i64_to_u64("clue_usage_id", row.try_get("id").map_err(ser)?)?),
        crossword_id: crossword_id_from_i64(row.try_get::<i64, _>("crossword_id").map_err(ser)?)?,
        profile_id: profile_id_from_str(&row.try_get::<String, _>("user_id").map_err(ser)?)?,
        used_at: row.try_get("used_at").map_err(ser)?,
    })
}

pub(crate) fn map_learning_row(row: &SqliteRow) -> Result<LearningProgress, StorageError> {
    Ok(LearningProgress {
        id: LearningProgressId::new(i64_to_u64(
            "learning_progress_id",
            row.try_get("id").map_err(ser)?,
        )?),
        profile_id: profile_id_from_str(&row.try_get::<String, _>("user_id").map_err(ser)?)?,
        topic: row.try_get::<String, _>("topic").map_err(ser)?.parse().map_err(ser)?,
        difficulty: row
            .try_get::<String, _>("difficulty")
            .map_err(ser)?
            .parse()
            .map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_profile_row(row: &SqliteRow) -> Result<Profile, StorageError> {
    let role = row
        .try_get::<Option<String>, _>("role")
        .map_err(ser)?
        .as_deref()
        .map(str::parse::<AppRole>)
        .transpose()
        .map_err(ser)?;
    Ok(Profile::new(
        profile_id_from_str(&row.try_get::<String, _>("id").map_err(ser)?)?,
        row.try_get("username").map_err(ser)?,
        role,
    ))
}
