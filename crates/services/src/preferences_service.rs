use std::sync::Arc;

use quiz_core::model::{StreakState, Theme};
use storage::repository::PreferencesRepository;

use crate::Clock;
use crate::error::PreferencesError;

/// Device preferences: daily login streak and colour theme.
#[derive(Clone)]
pub struct PreferencesService {
    clock: Clock,
    repo: Arc<dyn PreferencesRepository>,
}

impl PreferencesService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn PreferencesRepository>) -> Self {
        Self { clock, repo }
    }

    /// Register today's login and return the updated streak.
    ///
    /// Saves only when the streak changed, so repeated check-ins on the same
    /// day are read-only.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesError::Storage` if the streak cannot be loaded or saved.
    pub async fn check_in(&self) -> Result<StreakState, PreferencesError> {
        let today = self.clock.today();
        let current = self.repo.load_streak().await?;
        let next = current.register_login(today);
        if next != current {
            self.repo.save_streak(&next).await?;
            tracing::info!(count = next.count(), %today, "streak updated");
        }
        Ok(next)
    }

    /// Stored theme, falling back to the default when none was picked.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesError::Storage` if the theme cannot be loaded.
    pub async fn theme(&self) -> Result<Theme, PreferencesError> {
        Ok(self.repo.load_theme().await?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns `PreferencesError::Storage` if the theme cannot be saved.
    pub async fn set_theme(&self, theme: Theme) -> Result<(), PreferencesError> {
        self.repo.save_theme(theme).await?;
        Ok(())
    }

    /// Flip between light and dark, returning the new theme.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesError::Storage` if the theme cannot be loaded or saved.
    pub async fn toggle_theme(&self) -> Result<Theme, PreferencesError> {
        let next = self.theme().await?.toggled();
        self.set_theme(next).await?;
        tracing::debug!(theme = %next, "theme toggled");
        Ok(next)
    }
}
