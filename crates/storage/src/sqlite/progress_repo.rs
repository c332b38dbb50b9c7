use async_trait::async_trait;
use quiz_core::model::{ActivityKind, ProgressRecord};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{ProgressRepository, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn map_progress_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProgressRecord, StorageError> {
    let activity: String = row.try_get("activity").map_err(ser)?;
    let activity: ActivityKind = activity.parse().map_err(ser)?;
    let points: i64 = row.try_get("daily_points").map_err(ser)?;
    let points = u32::try_from(points)
        .map_err(|_| StorageError::Serialization(format!("invalid daily_points: {points}")))?;
    let recorded_at = row.try_get("recorded_at").map_err(ser)?;
    Ok(ProgressRecord::new(points, activity, recorded_at))
}

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO progress (activity, daily_points, recorded_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(record.activity().as_str())
        .bind(i64::from(record.daily_points()))
        .bind(record.recorded_at())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }

    async fn recent_progress(&self, limit: u32) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT activity, daily_points, recorded_at
            FROM progress
            ORDER BY recorded_at DESC, id DESC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        rows.iter().map(map_progress_row).collect()
    }
}
