use std::fmt;
use std::str::FromStr;

use quiz_core::model::{Question, QuestionPool, SessionLength};
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

/// How a session picks its questions from the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// The first `length` questions in pool order.
    #[default]
    Sequential,
    /// A uniform random sample of `length` distinct questions, in random order.
    Random,
}

impl SelectionPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionPolicy::Sequential => "sequential",
            SelectionPolicy::Random => "random",
        }
    }

    /// Pick `length` questions from `pool`, clamped to the pool size.
    ///
    /// The random policy shuffles a copy of the whole pool (Fisher-Yates via
    /// `SliceRandom::shuffle`) and keeps a prefix, so every subset and every
    /// order is equally likely.
    #[must_use]
    pub fn select<R: Rng + ?Sized>(
        self,
        pool: &QuestionPool,
        length: SessionLength,
        rng: &mut R,
    ) -> Vec<Question> {
        let take = length.clamp_to(pool.len());
        match self {
            SelectionPolicy::Sequential => pool.questions()[..take].to_vec(),
            SelectionPolicy::Random => {
                let mut questions = pool.questions().to_vec();
                questions.shuffle(rng);
                questions.truncate(take);
                questions
            }
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown selection policy: {0}")]
pub struct ParsePolicyError(pub String);

impl FromStr for SelectionPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(SelectionPolicy::Sequential),
            "random" => Ok(SelectionPolicy::Random),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}
