use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::AppSettings;
use storage::repository::{ProgressRepository, Storage};

use crate::Clock;
use crate::error::AppServicesError;
use crate::lesson_service::LessonCatalogService;
use crate::preferences_service::PreferencesService;
use crate::progress_client::HttpProgressClient;
use crate::sessions::QuizLoopService;

/// Assembles app-facing services from one `Storage`.
#[derive(Clone)]
pub struct AppServices {
    settings: AppSettings,
    quiz_loop: Arc<QuizLoopService>,
    lessons: Arc<LessonCatalogService>,
    preferences: Arc<PreferencesService>,
}

impl AppServices {
    /// Build services over JSON pools in `pool_dir` and a `SQLite` database.
    ///
    /// When `settings` names a progress base URL, points go to that server
    /// instead of the local database.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        pool_dir: impl Into<PathBuf>,
        clock: Clock,
        settings: AppSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url, pool_dir.into()).await?;
        Self::from_storage(storage, clock, settings)
    }

    /// Build services over an existing `Storage`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the remote progress client
    /// cannot be built.
    pub fn from_storage(
        storage: Storage,
        clock: Clock,
        settings: AppSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = match settings.progress_base_url() {
            Some(base) => {
                tracing::info!(%base, "saving progress to remote endpoint");
                let remote: Arc<dyn ProgressRepository> = Arc::new(HttpProgressClient::new(base)?);
                storage.with_progress(remote)
            }
            None => storage,
        };

        let quiz_loop = Arc::new(QuizLoopService::new(
            clock,
            settings.quiz().clone(),
            Arc::clone(&storage.pools),
            Arc::clone(&storage.progress),
        ));
        let lessons = Arc::new(LessonCatalogService::new(Arc::clone(&storage.lessons)));
        let preferences = Arc::new(PreferencesService::new(
            clock,
            Arc::clone(&storage.preferences),
        ));

        Ok(Self {
            settings,
            quiz_loop,
            lessons,
            preferences,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonCatalogService> {
        Arc::clone(&self.lessons)
    }

    #[must_use]
    pub fn preferences(&self) -> Arc<PreferencesService> {
        Arc::clone(&self.preferences)
    }
}
