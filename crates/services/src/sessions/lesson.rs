use std::collections::HashMap;

use quiz_core::evaluate;
use quiz_core::model::{Answer, LessonId, Outcome, Question, QuestionId, QuestionPool, QuizSettings};

use crate::error::AssessmentError;

/// End-of-lesson assessment: every question shown at once, graded on submit.
///
/// Answers can be changed freely until `submit`. Unanswered questions count
/// as wrong.
#[derive(Debug, Clone)]
pub struct LessonAssessment {
    lesson_id: LessonId,
    pool: QuestionPool,
    settings: QuizSettings,
    answers: HashMap<QuestionId, Answer>,
    graded: HashMap<QuestionId, bool>,
    outcome: Option<Outcome>,
}

impl LessonAssessment {
    #[must_use]
    pub fn new(lesson_id: LessonId, pool: QuestionPool, settings: QuizSettings) -> Self {
        Self {
            lesson_id,
            pool,
            settings,
            answers: HashMap::new(),
            graded: HashMap::new(),
            outcome: None,
        }
    }

    #[must_use]
    pub fn lesson_id(&self) -> &LessonId {
        &self.lesson_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        self.pool.questions()
    }

    /// Record or overwrite the answer for one question.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::AlreadySubmitted` after `submit`, or
    /// `AssessmentError::UnknownQuestion` for ids outside this lesson.
    pub fn record_answer(
        &mut self,
        question_id: &QuestionId,
        answer: impl Into<Answer>,
    ) -> Result<(), AssessmentError> {
        if self.outcome.is_some() {
            return Err(AssessmentError::AlreadySubmitted);
        }
        if self.pool.get(question_id).is_none() {
            return Err(AssessmentError::UnknownQuestion(question_id.clone()));
        }
        self.answers.insert(question_id.clone(), answer.into());
        Ok(())
    }

    #[must_use]
    pub fn answer_for(&self, question_id: &QuestionId) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Grade every question and lock the assessment.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::AlreadySubmitted` on a second submit.
    pub fn submit(&mut self) -> Result<Outcome, AssessmentError> {
        if self.outcome.is_some() {
            return Err(AssessmentError::AlreadySubmitted);
        }
        self.graded = self
            .pool
            .iter()
            .map(|question| {
                let correct = self
                    .answers
                    .get(question.id())
                    .is_some_and(|answer| evaluate(question, answer));
                (question.id().clone(), correct)
            })
            .collect();

        let score = self.graded.values().filter(|correct| **correct).count();
        let outcome = Outcome::compute(
            u32::try_from(score).unwrap_or(u32::MAX),
            u32::try_from(self.pool.len()).unwrap_or(u32::MAX),
            self.settings.passing_ratio(),
        );
        self.outcome = Some(outcome);
        Ok(outcome)
    }

    /// Outcome of the last submit, if any.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.outcome.is_some()
    }

    /// Per-question verdict after submit, for review screens.
    #[must_use]
    pub fn is_correct(&self, question_id: &QuestionId) -> Option<bool> {
        self.graded.get(question_id).copied()
    }

    /// Clear answers and verdict for a retake.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.graded.clear();
        self.outcome = None;
    }
}
