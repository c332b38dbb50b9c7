//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{LessonId, QuestionId, SessionLengthError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by quiz sessions and the quiz loop.
///
/// All variants except `Storage` are caller errors that leave the session
/// untouched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    InvalidSessionLength(#[from] SessionLengthError),
    #[error("session has not been started")]
    NotStarted,
    #[error("session already started")]
    AlreadyStarted,
    #[error("question {0} was already answered")]
    AlreadyAnswered(QuestionId),
    #[error("current question has not been answered yet")]
    NotAnswered,
    #[error("session already completed")]
    SessionComplete,
    #[error("expected an answer for question {expected}, got {found}")]
    WrongQuestion {
        expected: QuestionId,
        found: QuestionId,
    },
    #[error("session is not complete")]
    NotComplete,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LessonAssessment`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssessmentError {
    #[error("question {0} is not part of this lesson")]
    UnknownQuestion(QuestionId),
    #[error("assessment already submitted")]
    AlreadySubmitted,
}

/// Errors emitted by `MatchingGame`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MatchingError {
    #[error("matching game needs at least one term pair")]
    NoPairs,
}

/// Errors emitted by `LessonCatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("lesson not found: {0}")]
    NotFound(LessonId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `PreferencesService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PreferencesError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
