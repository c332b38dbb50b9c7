use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown activity kind: {0}")]
pub struct ParseActivityError(pub String);

/// Which activity produced a progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Assessment,
    TrueFalse,
    Identification,
    Lesson,
    Matching,
}

impl ActivityKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Assessment => "assessment",
            ActivityKind::TrueFalse => "true_false",
            ActivityKind::Identification => "identification",
            ActivityKind::Lesson => "lesson",
            ActivityKind::Matching => "matching",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = ParseActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assessment" => Ok(ActivityKind::Assessment),
            "true_false" => Ok(ActivityKind::TrueFalse),
            "identification" => Ok(ActivityKind::Identification),
            "lesson" => Ok(ActivityKind::Lesson),
            "matching" => Ok(ActivityKind::Matching),
            other => Err(ParseActivityError(other.to_string())),
        }
    }
}

/// Points earned in one activity, as handed to the progress store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    daily_points: u32,
    activity: ActivityKind,
    recorded_at: DateTime<Utc>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(daily_points: u32, activity: ActivityKind, recorded_at: DateTime<Utc>) -> Self {
        Self {
            daily_points,
            activity,
            recorded_at,
        }
    }

    #[must_use]
    pub fn daily_points(&self) -> u32 {
        self.daily_points
    }

    #[must_use]
    pub fn activity(&self) -> ActivityKind {
        self.activity
    }

    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_names_round_trip_through_str() {
        for kind in [
            ActivityKind::Assessment,
            ActivityKind::TrueFalse,
            ActivityKind::Identification,
            ActivityKind::Lesson,
            ActivityKind::Matching,
        ] {
            assert_eq!(kind.as_str().parse::<ActivityKind>().unwrap(), kind);
        }
        assert!("essay".parse::<ActivityKind>().is_err());
    }
}
