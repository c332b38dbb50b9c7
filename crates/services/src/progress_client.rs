//! Remote progress endpoint.
//!
//! Posts earned points to `<base>/api/progress` as
//! `{"dailyPoints": <n>, "type": "<activity>"}`.

use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::ProgressRecord;
use serde::Serialize;
use storage::repository::{ProgressRepository, StorageError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressPayload<'a> {
    daily_points: u32,
    #[serde(rename = "type")]
    activity: &'a str,
}

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// `ProgressRepository` backed by an HTTP server.
#[derive(Debug, Clone)]
pub struct HttpProgressClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpProgressClient {
    /// `base_url` is the server root, e.g. `http://localhost:4000`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, StorageError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Like `new`, with a custom whole-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the HTTP client cannot be built.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        let endpoint = format!("{}/api/progress", base_url.trim_end_matches('/'));
        Self { client, endpoint }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn request_error(err: &reqwest::Error) -> StorageError {
    if err.is_connect() || err.is_timeout() {
        StorageError::Unavailable(err.to_string())
    } else {
        StorageError::Connection(err.to_string())
    }
}

#[async_trait]
impl ProgressRepository for HttpProgressClient {
    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let payload = ProgressPayload {
            daily_points: record.daily_points(),
            activity: record.activity().as_str(),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| request_error(&e))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(StorageError::Unavailable(format!(
                "progress endpoint returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(StorageError::Rejected(format!(
                "progress endpoint rejected record: {status}"
            )));
        }
        tracing::debug!(endpoint = %self.endpoint, points = payload.daily_points, "progress posted");
        Ok(())
    }

    // `GET /api/progress` answers with a single `{dailyPoints, lastLessonId}`
    // snapshot that carries no activity or timestamp, so it cannot be read
    // back as records.
    async fn recent_progress(&self, _limit: u32) -> Result<Vec<ProgressRecord>, StorageError> {
        Err(StorageError::Unavailable(
            "remote progress endpoint does not serve history".into(),
        ))
    }
}
