use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of answering a single displayed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKind {
    Correct,
    Wrong,
    Skipped,
}

impl AnswerKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerKind::Correct => "correct",
            AnswerKind::Wrong => "wrong",
            AnswerKind::Skipped => "skipped",
        }
    }

    /// Wrong and skipped items both feed the retry set.
    #[must_use]
    pub fn feeds_retry(&self) -> bool {
        matches!(self, AnswerKind::Wrong | AnswerKind::Skipped)
    }
}

/// Lifecycle status of a persisted session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

impl SessionStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError(String);

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown session status: {}", self.0)
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for SessionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Percentage score, rounded to the nearest whole point.
///
/// An empty session scores 0 rather than dividing by zero.
#[must_use]
pub fn score_percent(correct: u32, completed: u32) -> u8 {
    if completed == 0 {
        return 0;
    }
    let pct = (f64::from(correct) * 100.0 / f64::from(completed)).round();
    // correct <= completed keeps this in 0..=100; clamp guards bad input.
    pct.clamp(0.0, 100.0) as u8
}
