use serde::{Deserialize, Serialize};

/// Final result of a session or lesson assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    score: u32,
    total: u32,
    passed: bool,
}

impl Outcome {
    /// Derive an outcome from a score against `passing_ratio`.
    ///
    /// `score` is clamped to `total`. A session with nothing to answer
    /// (`total == 0`) counts as passed.
    #[must_use]
    pub fn compute(score: u32, total: u32, passing_ratio: f64) -> Self {
        let score = score.min(total);
        let passed = total == 0 || f64::from(score) / f64::from(total) >= passing_ratio;
        Self {
            score,
            total,
            passed,
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Score as a percentage in `0.0..=100.0`; an empty session is 100%.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        f64::from(self.score) / f64::from(self.total) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passing_threshold_is_inclusive() {
        assert!(Outcome::compute(6, 10, 0.6).passed());
        assert!(!Outcome::compute(5, 10, 0.6).passed());
        // 5.0 * 0.6 is 3.0000000000000004, so 3/5 must be compared as a ratio.
        assert!(Outcome::compute(3, 5, 0.6).passed());
    }

    #[test]
    fn empty_session_passes() {
        let outcome = Outcome::compute(0, 0, 0.6);
        assert!(outcome.passed());
        assert_eq!(outcome.percentage(), 100.0);
    }

    #[test]
    fn score_is_clamped_to_total() {
        let outcome = Outcome::compute(12, 10, 0.6);
        assert_eq!(outcome.score(), 10);
        assert_eq!(outcome.percentage(), 100.0);
    }
}
