use thiserror::Error;
use url::Url;

use crate::model::settings::{QuizSettings, SettingsError};

/// Runtime configuration assembled from arguments and environment.
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    progress_base_url: Option<String>,
    quiz: QuizSettings,
}

#[derive(Clone, Debug, Default)]
pub struct AppSettingsDraft {
    pub progress_base_url: Option<String>,
    pub passing_ratio: Option<f64>,
    pub default_session_length: Option<u32>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppSettingsError {
    #[error("invalid progress base URL")]
    InvalidBaseUrl,
    #[error(transparent)]
    Quiz(#[from] SettingsError),
}

impl AppSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft into settings.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsError` if the base URL is present but invalid, or
    /// the quiz settings are out of range.
    pub fn validate(self) -> Result<AppSettings, AppSettingsError> {
        let progress_base_url = normalize_optional(self.progress_base_url);

        if let Some(url) = progress_base_url.as_ref() {
            let parsed = Url::parse(url).map_err(|_| AppSettingsError::InvalidBaseUrl)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppSettingsError::InvalidBaseUrl);
            }
        }

        let quiz = QuizSettings::new(
            self.passing_ratio
                .unwrap_or(QuizSettings::DEFAULT_PASSING_RATIO),
            self.default_session_length
                .unwrap_or(QuizSettings::DEFAULT_SESSION_LENGTH),
        )?;

        Ok(AppSettings {
            progress_base_url,
            quiz,
        })
    }
}

impl AppSettings {
    #[must_use]
    pub fn progress_base_url(&self) -> Option<&str> {
        self.progress_base_url.as_deref()
    }

    #[must_use]
    pub fn quiz(&self) -> &QuizSettings {
        &self.quiz
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            progress_base_url: None,
            quiz: QuizSettings::default(),
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
