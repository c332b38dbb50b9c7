#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod lesson_service;
pub mod matching;
pub mod preferences_service;
pub mod progress_client;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{
    AppServicesError, AssessmentError, CatalogError, MatchingError, PreferencesError,
    SessionError,
};
pub use lesson_service::LessonCatalogService;
pub use matching::{MatchCard, MatchingGame, RevealOutcome};
pub use preferences_service::PreferencesService;
pub use progress_client::HttpProgressClient;
pub use sessions::{
    LessonAssessment, QuizLoopService, QuizSession, SelectionPolicy, SessionProgress,
    SessionState, SubmitFeedback,
};
