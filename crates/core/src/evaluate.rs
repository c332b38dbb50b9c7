//! Answer grading, one rule per question kind.

use crate::model::{Answer, AnswerPattern, Question, QuestionKind};

/// Grade `answer` against `question`.
///
/// Total over its inputs: an answer of the wrong shape for the question
/// (a boolean for a multiple-choice question, say) is simply incorrect.
#[must_use]
pub fn evaluate(question: &Question, answer: &Answer) -> bool {
    match (question.kind(), answer) {
        (QuestionKind::MultipleChoice { correct, .. }, Answer::Text(choice)) => {
            matches_choice(correct, choice)
        }
        (QuestionKind::TrueFalse { answer: expected }, Answer::Bool(given)) => expected == given,
        (QuestionKind::Identification { pattern, .. }, Answer::Text(text)) => {
            matches_pattern(pattern, text)
        }
        _ => false,
    }
}

/// Exact, case-sensitive comparison with no trimming.
fn matches_choice(correct: &str, choice: &str) -> bool {
    correct == choice
}

fn matches_pattern(pattern: &AnswerPattern, text: &str) -> bool {
    pattern.is_match(text.trim())
}
