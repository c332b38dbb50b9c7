use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Consecutive-day login counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    last_login: Option<NaiveDate>,
    count: u32,
}

impl StreakState {
    #[must_use]
    pub fn new(last_login: Option<NaiveDate>, count: u32) -> Self {
        Self { last_login, count }
    }

    #[must_use]
    pub fn last_login(&self) -> Option<NaiveDate> {
        self.last_login
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Apply a login on `today`.
    ///
    /// A second login on the same day changes nothing; a login the day after
    /// the last one extends the streak; anything else starts over at 1.
    #[must_use]
    pub fn register_login(self, today: NaiveDate) -> Self {
        match self.last_login {
            Some(last) if last == today => self,
            Some(last) if last.succ_opt() == Some(today) => Self {
                last_login: Some(today),
                count: self.count.saturating_add(1),
            },
            _ => Self {
                last_login: Some(today),
                count: 1,
            },
        }
    }
}
