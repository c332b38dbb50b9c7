mod answer;
mod app_settings;
mod ids;
mod lesson;
mod outcome;
mod pool;
mod progress;
mod question;
mod settings;
mod streak;
mod theme;

pub use answer::Answer;
pub use app_settings::{AppSettings, AppSettingsDraft, AppSettingsError};
pub use ids::{LessonId, ParseTopicError, QuestionId, Topic};
pub use lesson::{Lesson, LessonError, LessonRecord, LessonSummary};
pub use outcome::Outcome;
pub use pool::{PoolError, QuestionPool};
pub use progress::{ActivityKind, ParseActivityError, ProgressRecord};
pub use question::{
    AnswerPattern, Question, QuestionError, QuestionKind, QuestionRecord, RecordAnswer,
    RecordKind,
};
pub use settings::{QuizSettings, SessionLength, SessionLengthError, SettingsError};
pub use streak::StreakState;
pub use theme::{ParseThemeError, Theme};
