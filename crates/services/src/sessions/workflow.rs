use std::sync::Arc;

use quiz_core::model::{
    ActivityKind, LessonId, ProgressRecord, QuestionPool, QuizSettings, SessionLength, Topic,
};
use storage::repository::{ProgressRepository, QuestionPoolRepository};

use super::lesson::LessonAssessment;
use super::selection::SelectionPolicy;
use super::service::QuizSession;
use crate::Clock;
use crate::error::SessionError;
use crate::matching::MatchingGame;

/// Orchestrates pool loading, session start, and progress saving.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    settings: QuizSettings,
    pools: Arc<dyn QuestionPoolRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: QuizSettings,
        pools: Arc<dyn QuestionPoolRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            settings,
            pools,
            progress,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Load the pool for `topic`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the provider fails.
    pub async fn load_pool(&self, topic: &Topic) -> Result<QuestionPool, SessionError> {
        self.pools.load_pool(topic).await.map_err(|err| {
            tracing::warn!(%topic, error = %err, "question pool unavailable");
            SessionError::Storage(err)
        })
    }

    /// Load a pool and start a session over it.
    ///
    /// `length` of `None` uses the configured default session length.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the pool cannot be loaded.
    pub async fn start_session(
        &self,
        topic: &Topic,
        length: Option<SessionLength>,
        policy: SelectionPolicy,
    ) -> Result<QuizSession, SessionError> {
        let pool = self.load_pool(topic).await?;
        let length = length.unwrap_or_else(|| self.settings.default_session_length());
        let mut session = QuizSession::new(pool, length, policy, self.settings.clone())
            .with_clock(self.clock);
        session.start()?;
        tracing::info!(
            %topic,
            %policy,
            requested = length.get(),
            total = session.total(),
            "quiz session started"
        );
        Ok(session)
    }

    /// Load a lesson's assessment questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the pool cannot be loaded.
    pub async fn start_lesson(&self, lesson_id: LessonId) -> Result<LessonAssessment, SessionError> {
        let topic = Topic::lesson(&lesson_id);
        let pool = self.load_pool(&topic).await?;
        tracing::info!(lesson = %lesson_id, questions = pool.len(), "lesson assessment loaded");
        Ok(LessonAssessment::new(lesson_id, pool, self.settings.clone()))
    }

    /// Save the score of a completed session as a progress record.
    ///
    /// The session is only read, so a failed save can be retried with the
    /// same session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` for unfinished sessions, or
    /// `SessionError::Storage` if the record cannot be saved.
    pub async fn finish_session(
        &self,
        session: &QuizSession,
        activity: ActivityKind,
    ) -> Result<ProgressRecord, SessionError> {
        let outcome = session.result()?;
        tracing::info!(
            score = outcome.score(),
            total = outcome.total(),
            passed = outcome.passed(),
            "quiz session complete"
        );
        self.save(ProgressRecord::new(outcome.score(), activity, self.clock.now()))
            .await
    }

    /// Save the score of a submitted lesson assessment.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` before the assessment is submitted,
    /// or `SessionError::Storage` if the record cannot be saved.
    pub async fn finish_lesson(
        &self,
        assessment: &LessonAssessment,
    ) -> Result<ProgressRecord, SessionError> {
        let outcome = assessment.outcome().ok_or(SessionError::NotComplete)?;
        tracing::info!(
            lesson = %assessment.lesson_id(),
            score = outcome.score(),
            total = outcome.total(),
            passed = outcome.passed(),
            "lesson assessment submitted"
        );
        self.save(ProgressRecord::new(
            outcome.score(),
            ActivityKind::Lesson,
            self.clock.now(),
        ))
        .await
    }

    /// Save the current score of a matching game. Allowed mid-game.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the record cannot be saved.
    pub async fn save_matching(&self, game: &MatchingGame) -> Result<ProgressRecord, SessionError> {
        self.save(ProgressRecord::new(
            game.score(),
            ActivityKind::Matching,
            self.clock.now(),
        ))
        .await
    }

    /// Most recent progress records, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the records cannot be fetched.
    pub async fn recent_progress(&self, limit: u32) -> Result<Vec<ProgressRecord>, SessionError> {
        Ok(self.progress.recent_progress(limit).await?)
    }

    async fn save(&self, record: ProgressRecord) -> Result<ProgressRecord, SessionError> {
        match self.progress.save_progress(&record).await {
            Ok(()) => {
                tracing::info!(
                    points = record.daily_points(),
                    activity = %record.activity(),
                    "progress saved"
                );
                Ok(record)
            }
            Err(err) => {
                tracing::warn!(
                    points = record.daily_points(),
                    activity = %record.activity(),
                    retryable = err.is_transient(),
                    error = %err,
                    "progress save failed"
                );
                Err(SessionError::Storage(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Question;
    use quiz_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, StorageError};

    fn service(repo: &InMemoryRepository) -> QuizLoopService {
        QuizLoopService::new(
            Clock::fixed(fixed_now()),
            QuizSettings::default(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    fn seed(repo: &InMemoryRepository, topic: &Topic, n: usize) {
        let pool = QuestionPool::new(
            (1..=n)
                .map(|i| Question::true_false(format!("tf{i}"), format!("Statement {i}"), true).unwrap())
                .collect(),
        )
        .unwrap();
        repo.insert_pool(topic.clone(), pool).unwrap();
    }

    #[tokio::test]
    async fn start_session_uses_default_length() {
        let repo = InMemoryRepository::new();
        let topic = Topic::new("interactive_question").with_section("true_false");
        seed(&repo, &topic, 15);

        let session = service(&repo)
            .start_session(&topic, None, SelectionPolicy::Sequential)
            .await
            .unwrap();
        assert_eq!(session.total(), 10);
    }

    #[tokio::test]
    async fn missing_pool_is_a_storage_error() {
        let repo = InMemoryRepository::new();
        let err = service(&repo)
            .start_session(&Topic::new("quiz_pool"), None, SelectionPolicy::Random)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Storage(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn unfinished_session_is_not_saved() {
        let repo = InMemoryRepository::new();
        let topic = Topic::new("quiz_pool");
        seed(&repo, &topic, 2);
        let svc = service(&repo);

        let session = svc
            .start_session(&topic, Some(SessionLength::new(2)), SelectionPolicy::Sequential)
            .await
            .unwrap();
        let err = svc
            .finish_session(&session, ActivityKind::Assessment)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotComplete));
        assert!(repo.recent_progress(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lesson_score_is_saved_after_submit() {
        let repo = InMemoryRepository::new();
        let lesson = LessonId::new("branches");
        seed(&repo, &Topic::lesson(&lesson), 3);
        let svc = service(&repo);

        let mut assessment = svc.start_lesson(lesson).await.unwrap();
        assert!(matches!(
            svc.finish_lesson(&assessment).await,
            Err(SessionError::NotComplete)
        ));

        let ids: Vec<_> = assessment.questions().iter().map(|q| q.id().clone()).collect();
        for id in &ids {
            assessment.record_answer(id, true).unwrap();
        }
        assessment.submit().unwrap();

        let record = svc.finish_lesson(&assessment).await.unwrap();
        assert_eq!(record.daily_points(), 3);
        assert_eq!(record.activity(), ActivityKind::Lesson);
    }
}
