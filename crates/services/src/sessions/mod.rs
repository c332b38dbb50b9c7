mod lesson;
mod progress;
mod selection;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{AssessmentError, SessionError};
pub use lesson::LessonAssessment;
pub use progress::SessionProgress;
pub use selection::{ParsePolicyError, SelectionPolicy};
pub use service::{QuizSession, SessionState, SubmitFeedback};
pub use workflow::QuizLoopService;
