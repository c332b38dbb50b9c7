use thiserror::Error;

use crate::model::{
    AppSettingsError, LessonError, ParseActivityError, ParseThemeError, PoolError, QuestionError,
    SessionLengthError, SettingsError,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    SessionLength(#[from] SessionLengthError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    AppSettings(#[from] AppSettingsError),
    #[error(transparent)]
    Theme(#[from] ParseThemeError),
    #[error(transparent)]
    Activity(#[from] ParseActivityError),
}
