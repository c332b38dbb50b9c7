use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::evaluate;
use quiz_core::model::{
    Answer, Outcome, Question, QuestionId, QuestionPool, QuizSettings, SessionLength,
};
use rand::Rng;

use super::progress::SessionProgress;
use super::selection::SelectionPolicy;
use crate::Clock;
use crate::error::SessionError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a quiz session.
///
/// `NotStarted -> InProgress <-> AwaitingAdvance -> Complete`, with `abandon`
/// returning to `NotStarted` from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    /// The current question has no answer yet.
    InProgress,
    /// The current question is answered and feedback is showing.
    AwaitingAdvance,
    Complete,
}

impl SessionState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::NotStarted => "not_started",
            SessionState::InProgress => "in_progress",
            SessionState::AwaitingAdvance => "awaiting_advance",
            SessionState::Complete => "complete",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── FEEDBACK ──────────────────────────────────────────────────────────────────
//

/// Result of grading one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFeedback {
    pub question_id: QuestionId,
    pub correct: bool,
    /// Running score after this answer.
    pub score: u32,
    /// Correct answer to reveal, when the question carries one.
    pub correct_answer: Option<String>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One pass through a selection of questions drawn from a pool.
///
/// The session owns its selection, answers, and score. Nothing here touches
/// storage; persistence happens in `QuizLoopService` once the session is
/// complete.
pub struct QuizSession {
    pool: Arc<QuestionPool>,
    length: SessionLength,
    policy: SelectionPolicy,
    settings: QuizSettings,
    clock: Clock,
    state: SessionState,
    questions: Vec<Question>,
    cursor: usize,
    answers: HashMap<QuestionId, Answer>,
    results: Vec<SubmitFeedback>,
    score: u32,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Create a session in `NotStarted`. No questions are selected until `start`.
    #[must_use]
    pub fn new(
        pool: impl Into<Arc<QuestionPool>>,
        length: SessionLength,
        policy: SelectionPolicy,
        settings: QuizSettings,
    ) -> Self {
        Self {
            pool: pool.into(),
            length,
            policy,
            settings,
            clock: Clock::default(),
            state: SessionState::NotStarted,
            questions: Vec::new(),
            cursor: 0,
            answers: HashMap::new(),
            results: Vec::new(),
            score: 0,
            started_at: None,
            completed_at: None,
        }
    }

    /// Like `new`, but the requested length comes from untrusted input.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidSessionLength` for negative lengths.
    pub fn with_requested_length(
        pool: impl Into<Arc<QuestionPool>>,
        requested: i64,
        policy: SelectionPolicy,
        settings: QuizSettings,
    ) -> Result<Self, SessionError> {
        let length = SessionLength::try_from(requested)?;
        Ok(Self::new(pool, length, policy, settings))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// Select questions and move to `InProgress`, or straight to `Complete`
    /// when the selection is empty.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` unless the session is `NotStarted`.
    pub fn start(&mut self) -> Result<SessionState, SessionError> {
        self.start_with_rng(&mut rand::rng())
    }

    /// `start` with a caller-supplied random source.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` unless the session is `NotStarted`.
    pub fn start_with_rng<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<SessionState, SessionError> {
        if self.state != SessionState::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        self.begin(rng);
        Ok(self.state)
    }

    /// Grade an answer for the current question and move to `AwaitingAdvance`.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotStarted` before `start`.
    /// - `SessionError::SessionComplete` once complete.
    /// - `SessionError::AlreadyAnswered` if `question_id` already has an answer.
    /// - `SessionError::WrongQuestion` if `question_id` is not the current question.
    pub fn submit(
        &mut self,
        question_id: &QuestionId,
        answer: impl Into<Answer>,
    ) -> Result<SubmitFeedback, SessionError> {
        match self.state {
            SessionState::NotStarted => return Err(SessionError::NotStarted),
            SessionState::Complete => return Err(SessionError::SessionComplete),
            SessionState::InProgress | SessionState::AwaitingAdvance => {}
        }
        if self.answers.contains_key(question_id) {
            return Err(SessionError::AlreadyAnswered(question_id.clone()));
        }
        let question = self
            .questions
            .get(self.cursor)
            .ok_or(SessionError::SessionComplete)?;
        if question.id() != question_id {
            return Err(SessionError::WrongQuestion {
                expected: question.id().clone(),
                found: question_id.clone(),
            });
        }

        let answer = answer.into();
        let correct = evaluate(question, &answer);
        if correct {
            self.score = self.score.saturating_add(1);
        }
        let feedback = SubmitFeedback {
            question_id: question_id.clone(),
            correct,
            score: self.score,
            correct_answer: question.display_answer(),
        };

        self.answers.insert(question_id.clone(), answer);
        self.results.push(feedback.clone());
        self.state = SessionState::AwaitingAdvance;
        Ok(feedback)
    }

    /// Move past an answered question; completes the session after the last one.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotStarted` before `start`.
    /// - `SessionError::NotAnswered` if the current question has no answer.
    /// - `SessionError::SessionComplete` once complete.
    pub fn advance(&mut self) -> Result<SessionState, SessionError> {
        match self.state {
            SessionState::NotStarted => Err(SessionError::NotStarted),
            SessionState::InProgress => Err(SessionError::NotAnswered),
            SessionState::Complete => Err(SessionError::SessionComplete),
            SessionState::AwaitingAdvance => {
                if self.cursor + 1 < self.questions.len() {
                    self.cursor += 1;
                    self.state = SessionState::InProgress;
                } else {
                    self.complete();
                }
                Ok(self.state)
            }
        }
    }

    /// Discard all progress and return to `NotStarted`. Always allowed.
    pub fn abandon(&mut self) {
        self.reset();
        self.state = SessionState::NotStarted;
    }

    /// Abandon and start again with a fresh selection and a zero score.
    pub fn restart(&mut self) -> SessionState {
        self.restart_with_rng(&mut rand::rng())
    }

    /// `restart` with a caller-supplied random source.
    pub fn restart_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SessionState {
        self.abandon();
        self.begin(rng);
        self.state
    }

    fn begin<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.reset();
        self.questions = self.policy.select(&self.pool, self.length, rng);
        self.started_at = Some(self.clock.now());
        if self.questions.is_empty() {
            self.complete();
        } else {
            self.state = SessionState::InProgress;
        }
    }

    fn complete(&mut self) {
        self.state = SessionState::Complete;
        self.completed_at = Some(self.clock.now());
    }

    fn reset(&mut self) {
        self.questions.clear();
        self.cursor = 0;
        self.answers.clear();
        self.results.clear();
        self.score = 0;
        self.started_at = None;
        self.completed_at = None;
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    /// Score and pass/fail verdict of a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` until the session reaches `Complete`.
    pub fn result(&self) -> Result<Outcome, SessionError> {
        if self.state != SessionState::Complete {
            return Err(SessionError::NotComplete);
        }
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        Ok(Outcome::compute(
            self.score,
            total,
            self.settings.passing_ratio(),
        ))
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    /// Question on screen, if the session is running.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            SessionState::InProgress | SessionState::AwaitingAdvance => {
                self.questions.get(self.cursor)
            }
            SessionState::NotStarted | SessionState::Complete => None,
        }
    }

    /// Questions chosen for this run, in presentation order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answer_for(&self, question_id: &QuestionId) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    /// Feedback for the most recent submission.
    #[must_use]
    pub fn last_feedback(&self) -> Option<&SubmitFeedback> {
        self.results.last()
    }

    #[must_use]
    pub fn results(&self) -> &[SubmitFeedback] {
        &self.results
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Number of questions selected for this run.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    #[must_use]
    pub fn requested_length(&self) -> SessionLength {
        self.length
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.total();
        let answered = self.results.len();
        let position = match self.state {
            SessionState::NotStarted => 0,
            SessionState::Complete => total,
            SessionState::InProgress | SessionState::AwaitingAdvance => self.cursor + 1,
        };
        SessionProgress {
            position,
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("state", &self.state)
            .field("policy", &self.policy)
            .field("length", &self.length)
            .field("pool_len", &self.pool.len())
            .field("total", &self.questions.len())
            .field("cursor", &self.cursor)
            .field("score", &self.score)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn branches(id: &str, correct: &str) -> Question {
        Question::multiple_choice(
            id,
            "Which branch?",
            vec!["Executive".into(), "Legislative".into(), "Judiciary".into()],
            correct,
        )
        .unwrap()
    }

    fn pool(n: usize) -> QuestionPool {
        QuestionPool::new(
            (1..=n)
                .map(|i| branches(&format!("q{i}"), "Judiciary"))
                .collect(),
        )
        .unwrap()
    }

    fn started(pool: QuestionPool, length: usize, policy: SelectionPolicy) -> QuizSession {
        let mut session = QuizSession::new(
            pool,
            SessionLength::new(length),
            policy,
            QuizSettings::default(),
        )
        .with_clock(Clock::fixed(fixed_now()));
        session
            .start_with_rng(&mut StdRng::seed_from_u64(9))
            .unwrap();
        session
    }

    fn current_id(session: &QuizSession) -> QuestionId {
        session.current_question().unwrap().id().clone()
    }

    fn answer_and_advance(session: &mut QuizSession, answer: &str) {
        let id = current_id(session);
        session.submit(&id, answer).unwrap();
        session.advance().unwrap();
    }

    #[test]
    fn new_session_is_not_started() {
        let session = QuizSession::new(
            pool(3),
            SessionLength::new(3),
            SelectionPolicy::Sequential,
            QuizSettings::default(),
        );
        assert_eq!(session.state(), SessionState::NotStarted);
        assert!(session.current_question().is_none());
        assert_eq!(session.progress().position, 0);
    }

    #[test]
    fn negative_length_is_rejected() {
        let err = QuizSession::with_requested_length(
            pool(3),
            -1,
            SelectionPolicy::Sequential,
            QuizSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::InvalidSessionLength(_)));
    }

    #[test]
    fn start_selects_clamped_count() {
        let session = started(pool(4), 10, SelectionPolicy::Random);
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.total(), 4);
        assert_eq!(session.started_at(), Some(fixed_now()));
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut session = started(pool(2), 2, SelectionPolicy::Sequential);
        assert!(matches!(session.start(), Err(SessionError::AlreadyStarted)));
    }

    #[test]
    fn empty_pool_completes_immediately_and_passes() {
        let session = started(QuestionPool::empty(), 10, SelectionPolicy::Random);
        assert_eq!(session.state(), SessionState::Complete);
        let outcome = session.result().unwrap();
        assert_eq!((outcome.score(), outcome.total()), (0, 0));
        assert!(outcome.passed());
    }

    #[test]
    fn zero_length_session_is_empty() {
        let session = started(pool(5), 0, SelectionPolicy::Sequential);
        assert!(session.is_complete());
        assert_eq!(session.result().unwrap().total(), 0);
    }

    #[test]
    fn submit_records_feedback_and_awaits_advance() {
        let mut session = started(pool(2), 2, SelectionPolicy::Sequential);
        let id = current_id(&session);
        let feedback = session.submit(&id, "Judiciary").unwrap();
        assert!(feedback.correct);
        assert_eq!(feedback.score, 1);
        assert_eq!(feedback.correct_answer.as_deref(), Some("Judiciary"));
        assert_eq!(session.state(), SessionState::AwaitingAdvance);
        assert_eq!(session.answer_for(&id), Some(&Answer::text("Judiciary")));
    }

    #[test]
    fn submitting_twice_is_rejected_and_score_unchanged() {
        let mut session = started(pool(2), 2, SelectionPolicy::Sequential);
        let id = current_id(&session);
        session.submit(&id, "Judiciary").unwrap();
        let err = session.submit(&id, "Executive").unwrap_err();
        assert!(matches!(err, SessionError::AlreadyAnswered(ref q) if *q == id));
        assert_eq!(session.score(), 1);
        assert_eq!(session.answer_for(&id), Some(&Answer::text("Judiciary")));
        assert_eq!(session.results().len(), 1);
        assert!(session.last_feedback().is_some_and(|f| f.correct));
    }

    #[test]
    fn earlier_question_cannot_be_answered_again() {
        let mut session = started(pool(2), 2, SelectionPolicy::Sequential);
        let first = current_id(&session);
        answer_and_advance(&mut session, "Executive");
        let err = session.submit(&first, "Judiciary").unwrap_err();
        assert!(matches!(err, SessionError::AlreadyAnswered(_)));
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn answer_for_other_question_is_rejected() {
        let mut session = started(pool(3), 3, SelectionPolicy::Sequential);
        let err = session.submit(&QuestionId::new("q3"), "Judiciary").unwrap_err();
        assert!(matches!(err, SessionError::WrongQuestion { .. }));
        assert_eq!(session.state(), SessionState::InProgress);
    }

    #[test]
    fn advance_without_answer_is_rejected() {
        let mut session = started(pool(2), 2, SelectionPolicy::Sequential);
        assert!(matches!(session.advance(), Err(SessionError::NotAnswered)));
    }

    #[test]
    fn operations_before_start_are_rejected() {
        let mut session = QuizSession::new(
            pool(1),
            SessionLength::new(1),
            SelectionPolicy::Sequential,
            QuizSettings::default(),
        );
        assert!(matches!(
            session.submit(&QuestionId::new("q1"), "Judiciary"),
            Err(SessionError::NotStarted)
        ));
        assert!(matches!(session.advance(), Err(SessionError::NotStarted)));
        assert!(matches!(session.result(), Err(SessionError::NotComplete)));
    }

    #[test]
    fn completes_after_last_question() {
        let mut session = started(pool(3), 3, SelectionPolicy::Sequential);
        answer_and_advance(&mut session, "Judiciary");
        answer_and_advance(&mut session, "Executive");
        assert!(session.result().is_err());
        answer_and_advance(&mut session, "Judiciary");

        assert_eq!(session.state(), SessionState::Complete);
        assert_eq!(session.completed_at(), Some(fixed_now()));
        let outcome = session.result().unwrap();
        assert_eq!((outcome.score(), outcome.total()), (2, 3));
        assert!(outcome.passed());
    }

    #[test]
    fn complete_session_rejects_submit_and_advance() {
        let mut session = started(pool(1), 1, SelectionPolicy::Sequential);
        answer_and_advance(&mut session, "Judiciary");
        assert!(matches!(
            session.submit(&QuestionId::new("q1"), "Judiciary"),
            Err(SessionError::SessionComplete)
        ));
        assert!(matches!(session.advance(), Err(SessionError::SessionComplete)));
    }

    #[test]
    fn pass_threshold_is_inclusive() {
        let mut session = started(pool(5), 5, SelectionPolicy::Sequential);
        for answer in ["Judiciary", "Judiciary", "Judiciary", "Executive", "Executive"] {
            answer_and_advance(&mut session, answer);
        }
        assert!(session.result().unwrap().passed());

        let mut session = started(pool(5), 5, SelectionPolicy::Sequential);
        for answer in ["Judiciary", "Judiciary", "Executive", "Executive", "Executive"] {
            answer_and_advance(&mut session, answer);
        }
        assert!(!session.result().unwrap().passed());
    }

    #[test]
    fn score_never_exceeds_total() {
        let mut session = started(pool(4), 4, SelectionPolicy::Random);
        while !session.is_complete() {
            let id = current_id(&session);
            session.submit(&id, "Judiciary").unwrap();
            let _ = session.submit(&id, "Judiciary");
            session.advance().unwrap();
        }
        assert_eq!(session.score(), 4);
        assert!(session.score() as usize <= session.total());
    }

    #[test]
    fn abandon_resets_everything() {
        let mut session = started(pool(3), 3, SelectionPolicy::Sequential);
        answer_and_advance(&mut session, "Judiciary");
        session.abandon();

        assert_eq!(session.state(), SessionState::NotStarted);
        assert_eq!(session.score(), 0);
        assert_eq!(session.total(), 0);
        assert!(session.results().is_empty());
        assert!(session.answer_for(&QuestionId::new("q1")).is_none());
    }

    #[test]
    fn restart_begins_a_fresh_run() {
        let mut session = started(pool(3), 3, SelectionPolicy::Sequential);
        answer_and_advance(&mut session, "Judiciary");
        answer_and_advance(&mut session, "Judiciary");

        let state = session.restart_with_rng(&mut StdRng::seed_from_u64(1));
        assert_eq!(state, SessionState::InProgress);
        assert_eq!(session.score(), 0);
        assert_eq!(session.total(), 3);
        assert_eq!(current_id(&session).as_str(), "q1");
    }

    #[test]
    fn progress_tracks_position_and_answers() {
        let mut session = started(pool(3), 3, SelectionPolicy::Sequential);
        let id = current_id(&session);
        session.submit(&id, "Judiciary").unwrap();
        assert_eq!(
            session.progress(),
            SessionProgress {
                position: 1,
                total: 3,
                answered: 1,
                remaining: 2,
                is_complete: false,
            }
        );
        session.advance().unwrap();
        assert_eq!(session.progress().position, 2);
    }
}
