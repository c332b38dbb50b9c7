use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::Answer;
use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question {id}: prompt cannot be empty")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id}: needs at least 2 options, got {len}")]
    TooFewOptions { id: QuestionId, len: usize },

    #[error("question {id}: correct option is not one of the options")]
    CorrectOptionMissing { id: QuestionId },

    #[error("question {id}: missing answer")]
    MissingAnswer { id: QuestionId },

    #[error("question {id}: answer has the wrong type for a {kind} question")]
    AnswerTypeMismatch { id: QuestionId, kind: &'static str },

    #[error("question {id}: identification questions need an answer pattern")]
    MissingPattern { id: QuestionId },

    #[error("invalid answer pattern: {0}")]
    InvalidPattern(String),
}

//
// ─── ANSWER PATTERN ────────────────────────────────────────────────────────────
//

/// Case-insensitive regular expression an identification answer must match.
///
/// Compiled once at construction, so evaluation never fails. Matching is a
/// search: the pattern is unanchored unless it anchors itself.
#[derive(Clone)]
pub struct AnswerPattern {
    regex: Regex,
}

impl AnswerPattern {
    /// Compile a pattern in case-insensitive mode.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidPattern` if the pattern does not compile.
    pub fn new(pattern: &str) -> Result<Self, QuestionError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|err| QuestionError::InvalidPattern(err.to_string()))?;
        Ok(Self { regex })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for AnswerPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for AnswerPattern {}

impl fmt::Debug for AnswerPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnswerPattern({:?})", self.as_str())
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// The closed set of question shapes, each with its own grading rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<String>,
        correct: String,
    },
    TrueFalse {
        answer: bool,
    },
    Identification {
        pattern: AnswerPattern,
        /// Canonical answer shown after the fact.
        display: Option<String>,
    },
}

impl QuestionKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple",
            QuestionKind::TrueFalse { .. } => "true_false",
            QuestionKind::Identification { .. } => "identification",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    id: QuestionId,
    prompt: String,
    kind: QuestionKind,
}

impl Question {
    /// Build a multiple-choice question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id or prompt is empty, fewer than two
    /// options are given, or `correct` is not one of the options.
    pub fn multiple_choice(
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let (id, prompt) = validate_header(id.into(), prompt.into())?;
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                id,
                len: options.len(),
            });
        }
        let correct = correct.into();
        if !options.contains(&correct) {
            return Err(QuestionError::CorrectOptionMissing { id });
        }
        Ok(Self {
            id,
            prompt,
            kind: QuestionKind::MultipleChoice { options, correct },
        })
    }

    /// Build a true/false question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id or prompt is empty.
    pub fn true_false(
        id: impl Into<String>,
        prompt: impl Into<String>,
        answer: bool,
    ) -> Result<Self, QuestionError> {
        let (id, prompt) = validate_header(id.into(), prompt.into())?;
        Ok(Self {
            id,
            prompt,
            kind: QuestionKind::TrueFalse { answer },
        })
    }

    /// Build an identification question graded by `pattern`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id or prompt is empty or the pattern is invalid.
    pub fn identification(
        id: impl Into<String>,
        prompt: impl Into<String>,
        pattern: &str,
        display: Option<String>,
    ) -> Result<Self, QuestionError> {
        let (id, prompt) = validate_header(id.into(), prompt.into())?;
        let pattern = AnswerPattern::new(pattern)?;
        Ok(Self {
            id,
            prompt,
            kind: QuestionKind::Identification { pattern, display },
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    /// Options to present, empty for non multiple-choice questions.
    #[must_use]
    pub fn options(&self) -> &[String] {
        match &self.kind {
            QuestionKind::MultipleChoice { options, .. } => options,
            _ => &[],
        }
    }

    /// Human-readable correct answer for feedback, when one is known.
    #[must_use]
    pub fn display_answer(&self) -> Option<String> {
        match &self.kind {
            QuestionKind::MultipleChoice { correct, .. } => Some(correct.clone()),
            QuestionKind::TrueFalse { answer } => {
                Some(if *answer { "TRUE" } else { "FALSE" }.to_string())
            }
            QuestionKind::Identification { display, .. } => display.clone(),
        }
    }

    /// Grade an answer against this question.
    #[must_use]
    pub fn is_correct(&self, answer: &Answer) -> bool {
        crate::evaluate::evaluate(self, answer)
    }
}

fn validate_header(id: String, prompt: String) -> Result<(QuestionId, String), QuestionError> {
    let id = QuestionId::new(id);
    if id.is_empty() {
        return Err(QuestionError::EmptyId);
    }
    if prompt.trim().is_empty() {
        return Err(QuestionError::EmptyPrompt { id });
    }
    Ok((id, prompt))
}

//
// ─── WIRE RECORD ───────────────────────────────────────────────────────────────
//

/// Question `type` tag as it appears in content files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    #[serde(rename = "multiple")]
    Multiple,
    #[serde(rename = "true_false")]
    TrueFalse,
    #[serde(rename = "identification")]
    Identification,
}

/// `answer` field: a string for choice/identification, a bool for true/false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordAnswer {
    Bool(bool),
    Text(String),
}

/// Persisted JSON shape of a question.
///
/// Content files written before the `type` tag existed omit it; the kind is
/// then inferred from which fields are present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecordKind>,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<RecordAnswer>,
    #[serde(
        rename = "answerRegex",
        alias = "regex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub answer_regex: Option<String>,
}

impl QuestionRecord {
    fn resolved_kind(&self) -> RecordKind {
        if let Some(kind) = self.kind {
            return kind;
        }
        if self.answer_regex.is_some() {
            RecordKind::Identification
        } else if matches!(self.answer, Some(RecordAnswer::Bool(_))) {
            RecordKind::TrueFalse
        } else {
            RecordKind::Multiple
        }
    }
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        let id = QuestionId::new(record.id.clone());
        match record.resolved_kind() {
            RecordKind::Multiple => {
                let correct = match record.answer {
                    Some(RecordAnswer::Text(text)) => text,
                    Some(RecordAnswer::Bool(_)) => {
                        return Err(QuestionError::AnswerTypeMismatch {
                            id,
                            kind: "multiple",
                        });
                    }
                    None => return Err(QuestionError::MissingAnswer { id }),
                };
                Question::multiple_choice(
                    record.id,
                    record.question,
                    record.options.unwrap_or_default(),
                    correct,
                )
            }
            RecordKind::TrueFalse => match record.answer {
                Some(RecordAnswer::Bool(answer)) => {
                    Question::true_false(record.id, record.question, answer)
                }
                Some(RecordAnswer::Text(_)) => Err(QuestionError::AnswerTypeMismatch {
                    id,
                    kind: "true_false",
                }),
                None => Err(QuestionError::MissingAnswer { id }),
            },
            RecordKind::Identification => {
                let Some(pattern) = record.answer_regex else {
                    return Err(QuestionError::MissingPattern { id });
                };
                let display = match record.answer {
                    Some(RecordAnswer::Text(text)) => Some(text),
                    Some(RecordAnswer::Bool(_)) => {
                        return Err(QuestionError::AnswerTypeMismatch {
                            id,
                            kind: "identification",
                        });
                    }
                    None => None,
                };
                Question::identification(record.id, record.question, &pattern, display)
            }
        }
    }
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        let id = question.id.as_str().to_string();
        let prompt = question.prompt;
        match question.kind {
            QuestionKind::MultipleChoice { options, correct } => Self {
                id,
                kind: Some(RecordKind::Multiple),
                question: prompt,
                options: Some(options),
                answer: Some(RecordAnswer::Text(correct)),
                answer_regex: None,
            },
            QuestionKind::TrueFalse { answer } => Self {
                id,
                kind: Some(RecordKind::TrueFalse),
                question: prompt,
                options: None,
                answer: Some(RecordAnswer::Bool(answer)),
                answer_regex: None,
            },
            QuestionKind::Identification { pattern, display } => Self {
                id,
                kind: Some(RecordKind::Identification),
                question: prompt,
                options: None,
                answer: display.map(RecordAnswer::Text),
                answer_regex: Some(pattern.as_str().to_string()),
            },
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn multiple_choice_requires_two_options() {
        let err = Question::multiple_choice("q1", "Pick", opts(&["only"]), "only").unwrap_err();
        assert!(matches!(err, QuestionError::TooFewOptions { len: 1, .. }));
    }

    #[test]
    fn multiple_choice_requires_listed_correct_option() {
        let err =
            Question::multiple_choice("q1", "Pick", opts(&["a", "b"]), "c").unwrap_err();
        assert!(matches!(err, QuestionError::CorrectOptionMissing { .. }));
    }

    #[test]
    fn blank_id_and_prompt_are_rejected() {
        assert_eq!(
            Question::true_false(" ", "Stmt", true).unwrap_err(),
            QuestionError::EmptyId
        );
        assert!(matches!(
            Question::true_false("q1", "  ", true).unwrap_err(),
            QuestionError::EmptyPrompt { .. }
        ));
    }

    #[test]
    fn invalid_pattern_is_rejected_at_construction() {
        let err = Question::identification("q1", "Who?", "(unclosed", None).unwrap_err();
        assert!(matches!(err, QuestionError::InvalidPattern(_)));
    }

    #[test]
    fn deserializes_tagged_lesson_questions() {
        let json = r#"[
            {"id": "a1", "type": "multiple", "question": "Branch that makes law?",
             "options": ["Executive", "Legislative", "Judiciary"], "answer": "Legislative"},
            {"id": "a2", "type": "true_false", "question": "The 1987 Constitution is in force.", "answer": true},
            {"id": "a3", "type": "identification", "question": "First president of the 5th Republic?",
             "answer": "Corazon Aquino", "answerRegex": "^corazon( c\\.?)? aquino$"}
        ]"#;
        let questions: Vec<Question> = serde_json::from_str(json).unwrap();
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0].kind().name(), "multiple");
        assert_eq!(questions[1].kind(), &QuestionKind::TrueFalse { answer: true });
        assert_eq!(
            questions[2].display_answer().as_deref(),
            Some("Corazon Aquino")
        );
    }

    #[test]
    fn infers_kind_for_untagged_records() {
        let json = r#"[
            {"id": "tf1", "question": "Suffrage is the right to vote.", "answer": true},
            {"id": "id1", "question": "Article on the Bill of Rights?", "answer": "Article III", "regex": "article (iii|3)"},
            {"id": "mc1", "question": "Philippines 2000?", "options": ["Ramos", "Estrada"], "answer": "Ramos"}
        ]"#;
        let questions: Vec<Question> = serde_json::from_str(json).unwrap();
        assert_eq!(questions[0].kind().name(), "true_false");
        assert_eq!(questions[1].kind().name(), "identification");
        assert_eq!(questions[2].kind().name(), "multiple");
    }

    #[test]
    fn rejects_mismatched_answer_type() {
        let json = r#"{"id": "tf1", "type": "true_false", "question": "Stmt", "answer": "yes"}"#;
        let err = serde_json::from_str::<Question>(json).unwrap_err();
        assert!(err.to_string().contains("wrong type"));
    }

    #[test]
    fn serializes_back_to_wire_shape() {
        let question =
            Question::identification("q9", "Who?", "^ramos$", Some("Fidel Ramos".into())).unwrap();
        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["type"], "identification");
        assert_eq!(value["answerRegex"], "^ramos$");
        assert_eq!(value["answer"], "Fidel Ramos");
        assert!(value.get("options").is_none());
    }
}
