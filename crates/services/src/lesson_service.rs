use std::sync::Arc;

use quiz_core::model::{Lesson, LessonId, LessonSummary};
use storage::repository::{LessonRepository, StorageError};

use crate::error::CatalogError;

/// Browse and open course lessons.
#[derive(Clone)]
pub struct LessonCatalogService {
    repo: Arc<dyn LessonRepository>,
}

impl LessonCatalogService {
    #[must_use]
    pub fn new(repo: Arc<dyn LessonRepository>) -> Self {
        Self { repo }
    }

    /// Catalog entries whose title or excerpt contains `search`, ignoring
    /// case. `None` or a blank query lists everything.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the catalog cannot be read.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<LessonSummary>, CatalogError> {
        let mut lessons = self.repo.list_lessons().await?;
        if let Some(query) = search {
            lessons.retain(|lesson| lesson.matches(query));
        }
        tracing::debug!(matches = lessons.len(), search = ?search, "lesson catalog listed");
        Ok(lessons)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id, or
    /// `CatalogError::Storage` if the lesson cannot be read.
    pub async fn lesson(&self, id: &LessonId) -> Result<Lesson, CatalogError> {
        match self.repo.load_lesson(id).await {
            Ok(lesson) => Ok(lesson),
            Err(StorageError::NotFound) => Err(CatalogError::NotFound(id.clone())),
            Err(err) => {
                tracing::warn!(lesson = %id, error = %err, "lesson unavailable");
                Err(err.into())
            }
        }
    }
}
