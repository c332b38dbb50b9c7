#![forbid(unsafe_code)]

pub mod json;
pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, LessonRepository, PreferencesRepository, ProgressRepository, QuestionPoolRepository,
    Storage, StorageError,
};
