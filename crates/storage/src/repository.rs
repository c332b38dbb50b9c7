use async_trait::async_trait;
use quiz_core::model::{
    Lesson, LessonId, LessonSummary, ProgressRecord, QuestionPool, StreakState, Theme, Topic,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The collaborator could not be reached (offline, server down, I/O failure).
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The collaborator refused the input; resending it will not help.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl StorageError {
    /// True for failures a caller may retry later without changing its input.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Connection(_) | StorageError::Unavailable(_))
    }
}

/// Source of question pools, addressed by topic.
#[async_trait]
pub trait QuestionPoolRepository: Send + Sync {
    /// Load the full pool for a topic.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the topic does not exist,
    /// `StorageError::Serialization` if its content is malformed, or
    /// `StorageError::Unavailable` if the source cannot be read.
    async fn load_pool(&self, topic: &Topic) -> Result<QuestionPool, StorageError>;
}

/// Course lessons, listed light and loaded in full by id.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Every lesson's catalog entry, in source order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if a course file is malformed, or
    /// `StorageError::Unavailable` if the source cannot be read.
    async fn list_lessons(&self) -> Result<Vec<LessonSummary>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no lesson has this id.
    async fn load_lesson(&self, id: &LessonId) -> Result<Lesson, StorageError>;
}

/// Sink for earned points.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Persist one progress record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError>;

    /// Most recent records first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if records cannot be fetched.
    async fn recent_progress(&self, limit: u32) -> Result<Vec<ProgressRecord>, StorageError>;
}

/// Per-device preferences: theme and login streak.
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// Stored theme, or `None` if the user never picked one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the preference cannot be read or parsed.
    async fn load_theme(&self) -> Result<Option<Theme>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the preference cannot be stored.
    async fn save_theme(&self, theme: Theme) -> Result<(), StorageError>;

    /// Stored streak, or the empty streak if none was recorded yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the streak cannot be read or parsed.
    async fn load_streak(&self) -> Result<StreakState, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the streak cannot be stored.
    async fn save_streak(&self, state: &StreakState) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    pools: Arc<Mutex<HashMap<Topic, QuestionPool>>>,
    lessons: Arc<Mutex<Vec<Lesson>>>,
    progress: Arc<Mutex<Vec<ProgressRecord>>>,
    theme: Arc<Mutex<Option<Theme>>>,
    streak: Arc<Mutex<Option<StreakState>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the pool served for `topic`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn insert_pool(&self, topic: Topic, pool: QuestionPool) -> Result<(), StorageError> {
        let mut guard = self
            .pools
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(topic, pool);
        Ok(())
    }

    /// Add a lesson, replacing any lesson with the same id in place.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn insert_lesson(&self, lesson: Lesson) -> Result<(), StorageError> {
        let mut guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.iter_mut().find(|l| l.id() == lesson.id()) {
            Some(existing) => *existing = lesson,
            None => guard.push(lesson),
        }
        Ok(())
    }
}

#[async_trait]
impl QuestionPoolRepository for InMemoryRepository {
    async fn load_pool(&self, topic: &Topic) -> Result<QuestionPool, StorageError> {
        let guard = self
            .pools
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(topic).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn list_lessons(&self) -> Result<Vec<LessonSummary>, StorageError> {
        let guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.iter().map(Lesson::summary).collect())
    }

    async fn load_lesson(&self, id: &LessonId) -> Result<Lesson, StorageError> {
        let guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|l| l.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(record.clone());
        Ok(())
    }

    async fn recent_progress(&self, limit: u32) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

#[async_trait]
impl PreferencesRepository for InMemoryRepository {
    async fn load_theme(&self) -> Result<Option<Theme>, StorageError> {
        let guard = self
            .theme
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(*guard)
    }

    async fn save_theme(&self, theme: Theme) -> Result<(), StorageError> {
        let mut guard = self
            .theme
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(theme);
        Ok(())
    }

    async fn load_streak(&self) -> Result<StreakState, StorageError> {
        let guard = self
            .streak
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.unwrap_or_default())
    }

    async fn save_streak(&self, state: &StreakState) -> Result<(), StorageError> {
        let mut guard = self
            .streak
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(*state);
        Ok(())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub pools: Arc<dyn QuestionPoolRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub preferences: Arc<dyn PreferencesRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Use one in-memory repository for every concern, keeping a handle for seeding.
    #[must_use]
    pub fn from_repository(repo: InMemoryRepository) -> Self {
        let pools: Arc<dyn QuestionPoolRepository> = Arc::new(repo.clone());
        let lessons: Arc<dyn LessonRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let preferences: Arc<dyn PreferencesRepository> = Arc::new(repo);
        Self {
            pools,
            lessons,
            progress,
            preferences,
        }
    }

    /// Replace the progress sink, e.g. with a remote endpoint.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressRepository>) -> Self {
        self.progress = progress;
        self
    }
}
