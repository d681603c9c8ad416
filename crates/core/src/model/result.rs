use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("score ({score}) exceeds total ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("percentage out of range: {0}")]
    PercentageOutOfRange(u8),
}

/// Outcome of one submitted quiz, as appended to the learner's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuizResultRecord")]
pub struct QuizResult {
    score: u32,
    total: u32,
    percentage: u8,
    taken_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct QuizResultRecord {
    score: u32,
    total: u32,
    percentage: u8,
    taken_at: DateTime<Utc>,
}

impl TryFrom<QuizResultRecord> for QuizResult {
    type Error = QuizResultError;

    fn try_from(r: QuizResultRecord) -> Result<Self, Self::Error> {
        Self::from_persisted(r.score, r.total, r.percentage, r.taken_at)
    }
}

impl QuizResult {
    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError` if the score exceeds the total or the
    /// percentage is above 100.
    pub fn from_persisted(
        score: u32,
        total: u32,
        percentage: u8,
        taken_at: DateTime<Utc>,
    ) -> Result<Self, QuizResultError> {
        if score > total {
            return Err(QuizResultError::ScoreExceedsTotal { score, total });
        }
        if percentage > 100 {
            return Err(QuizResultError::PercentageOutOfRange(percentage));
        }
        Ok(Self {
            score,
            total,
            percentage,
            taken_at,
        })
    }

    pub(crate) fn scored(score: u32, total: u32, percentage: u8, taken_at: DateTime<Utc>) -> Self {
        Self {
            score,
            total,
            percentage,
            taken_at,
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
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    #[must_use]
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }
}
