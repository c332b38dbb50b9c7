use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use quiz_core::model::{StreakState, Theme};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{PreferencesRepository, StorageError};

// Keys shared with the mobile app's device store.
const THEME_KEY: &str = "user_theme";
const STREAK_KEY: &str = "streak";
const LAST_LOGIN_KEY: &str = "lastLoginDate";

const DATE_FORMAT: &str = "%Y-%m-%d";

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

impl SqliteRepository {
    async fn get_value(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM preferences WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        row.map(|row| row.try_get::<String, _>("value").map_err(ser))
            .transpose()
    }
}

const UPSERT: &str = r"
    INSERT INTO preferences (key, value, updated_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
";

#[async_trait]
impl PreferencesRepository for SqliteRepository {
    async fn load_theme(&self) -> Result<Option<Theme>, StorageError> {
        self.get_value(THEME_KEY)
            .await?
            .map(|raw| raw.parse::<Theme>().map_err(ser))
            .transpose()
    }

    async fn save_theme(&self, theme: Theme) -> Result<(), StorageError> {
        sqlx::query(UPSERT)
            .bind(THEME_KEY)
            .bind(theme.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }

    async fn load_streak(&self) -> Result<StreakState, StorageError> {
        let count = match self.get_value(STREAK_KEY).await? {
            Some(raw) => raw.trim().parse::<u32>().map_err(ser)?,
            None => 0,
        };
        let last_login = self
            .get_value(LAST_LOGIN_KEY)
            .await?
            .map(|raw| NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(ser))
            .transpose()?;
        Ok(StreakState::new(last_login, count))
    }

    async fn save_streak(&self, state: &StreakState) -> Result<(), StorageError> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        sqlx::query(UPSERT)
            .bind(STREAK_KEY)
            .bind(state.count().to_string())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        match state.last_login() {
            Some(day) => {
                sqlx::query(UPSERT)
                    .bind(LAST_LOGIN_KEY)
                    .bind(day.format(DATE_FORMAT).to_string())
                    .bind(now)
                    .execute(&mut *tx)
                    .await
                    .map_err(|err| StorageError::Connection(err.to_string()))?;
            }
            None => {
                sqlx::query("DELETE FROM preferences WHERE key = ?1")
                    .bind(LAST_LOGIN_KEY)
                    .execute(&mut *tx)
                    .await
                    .map_err(|err| StorageError::Connection(err.to_string()))?;
            }
        }

        tx.commit()
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
