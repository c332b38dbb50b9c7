use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("passing ratio must be within [0, 1], got {0}")]
    InvalidPassingRatio(f64),

    #[error("default session length must be > 0")]
    InvalidDefaultSessionLength,
}

/// Raised when a caller asks for a negative number of questions.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("session length cannot be negative (got {0})")]
pub struct SessionLengthError(pub i64);

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Scoring and sizing knobs shared by every quiz variant.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSettings {
    passing_ratio: f64,
    default_session_length: u32,
}

impl QuizSettings {
    /// Observed default pass mark: 60%.
    pub const DEFAULT_PASSING_RATIO: f64 = 0.6;
    /// Shortest option on the assessment menu (10 / 20 / 30).
    pub const DEFAULT_SESSION_LENGTH: u32 = 10;

    /// # Errors
    ///
    /// Returns `SettingsError` if the ratio is outside `[0, 1]` (or NaN) or the
    /// default length is zero.
    pub fn new(passing_ratio: f64, default_session_length: u32) -> Result<Self, SettingsError> {
        if !(0.0..=1.0).contains(&passing_ratio) {
            return Err(SettingsError::InvalidPassingRatio(passing_ratio));
        }
        if default_session_length == 0 {
            return Err(SettingsError::InvalidDefaultSessionLength);
        }
        Ok(Self {
            passing_ratio,
            default_session_length,
        })
    }

    #[must_use]
    pub fn passing_ratio(&self) -> f64 {
        self.passing_ratio
    }

    #[must_use]
    pub fn default_session_length(&self) -> SessionLength {
        SessionLength::new(usize::try_from(self.default_session_length).unwrap_or(usize::MAX))
    }

    /// Return a copy with a different passing ratio.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidPassingRatio` if the ratio is out of range.
    pub fn with_passing_ratio(&self, passing_ratio: f64) -> Result<Self, SettingsError> {
        Self::new(passing_ratio, self.default_session_length)
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            passing_ratio: Self::DEFAULT_PASSING_RATIO,
            default_session_length: Self::DEFAULT_SESSION_LENGTH,
        }
    }
}

//
// ─── SESSION LENGTH ────────────────────────────────────────────────────────────
//

/// Number of questions requested for a session, before clamping to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionLength(usize);

impl SessionLength {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self(len)
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }

    /// Requests beyond the pool size are clamped to it.
    #[must_use]
    pub fn clamp_to(self, pool_len: usize) -> usize {
        self.0.min(pool_len)
    }
}

impl TryFrom<i64> for SessionLength {
    type Error = SessionLengthError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 0 {
            return Err(SessionLengthError(value));
        }
        Ok(Self(usize::try_from(value).unwrap_or(usize::MAX)))
    }
}
