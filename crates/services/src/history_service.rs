use std::collections::BTreeSet;
use std::sync::Arc;

use quiz_core::model::{PrincipalId, QuizResult};
use quiz_core::scoring::rounded_percentage;
use storage::repository::ProfileRepository;

use crate::error::SessionError;

/// The latest result must move strictly more than this many points from the baseline.
const TREND_THRESHOLD: i16 = 5;

/// Results considered for `trend` and `recent`.
const RECENT_WINDOW: usize = 3;

/// Direction of recent quiz performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceTrend {
    Improving,
    Declining,
    Stable,
}

/// Presentation-agnostic summary of a learner's quiz history.
///
/// No pre-formatted strings; the UI decides how to render percentages and dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultOverview {
    pub attempts: usize,
    /// Mean percentage over every attempt, rounded half up. 0 with no attempts.
    pub overall_percentage: u8,
    pub trend: PerformanceTrend,
    /// Up to three most recent results, newest first.
    pub recent: Vec<QuizResult>,
    /// Distinct UTC calendar days with at least one result.
    pub active_days: usize,
}

impl ResultOverview {
    #[must_use]
    pub fn from_history(history: &[QuizResult]) -> Self {
        let sum: u64 = history.iter().map(|r| u64::from(r.percentage())).sum();
        let active_days = history
            .iter()
            .map(|r| r.taken_at().date_naive())
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            attempts: history.len(),
            overall_percentage: rounded_percentage(sum, history.len() as u64 * 100),
            trend: trend_of(history),
            recent: history.iter().rev().take(RECENT_WINDOW).cloned().collect(),
            active_days,
        }
    }
}

fn trend_of(history: &[QuizResult]) -> PerformanceTrend {
    let window = &history[history.len().saturating_sub(RECENT_WINDOW)..];
    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return PerformanceTrend::Stable;
    };
    if window.len() < 2 {
        return PerformanceTrend::Stable;
    }

    let delta = i16::from(last.percentage()) - i16::from(first.percentage());
    if delta > TREND_THRESHOLD {
        PerformanceTrend::Improving
    } else if delta < -TREND_THRESHOLD {
        PerformanceTrend::Declining
    } else {
        PerformanceTrend::Stable
    }
}

/// Read-side queries over recorded quiz results.
#[derive(Clone)]
pub struct ResultHistoryService {
    profiles: Arc<dyn ProfileRepository>,
}

impl ResultHistoryService {
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    /// Results for `principal` in the order they were recorded.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ProfileNotFound` if the principal has no profile,
    /// or `SessionError::Storage` on repository failures.
    pub async fn history(&self, principal: &PrincipalId) -> Result<Vec<QuizResult>, SessionError> {
        let profile = self
            .profiles
            .get_profile(principal)
            .await?
            .ok_or_else(|| SessionError::ProfileNotFound(principal.clone()))?;
        Ok(profile.quiz_results().to_vec())
    }

    /// Aggregate view of the principal's history.
    ///
    /// # Errors
    ///
    /// Same as [`ResultHistoryService::history`].
    pub async fn overview(&self, principal: &PrincipalId) -> Result<ResultOverview, SessionError> {
        let history = self.history(principal).await?;
        Ok(ResultOverview::from_history(&history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::Profile;
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn result(score: u32, total: u32, days_later: i64) -> QuizResult {
        let percentage = rounded_percentage(u64::from(score), u64::from(total));
        QuizResult::from_persisted(score, total, percentage, fixed_now() + Duration::days(days_later))
            .unwrap()
    }

    #[test]
    fn empty_history_is_stable_and_zero() {
        let overview = ResultOverview::from_history(&[]);
        assert_eq!(overview.attempts, 0);
        assert_eq!(overview.overall_percentage, 0);
        assert_eq!(overview.trend, PerformanceTrend::Stable);
        assert!(overview.recent.is_empty());
        assert_eq!(overview.active_days, 0);
    }

    #[test]
    fn overview_aggregates_history() {
        let history = vec![
            result(2, 4, 0),  // 50
            result(3, 4, 0),  // 75
            result(1, 4, 1),  // 25
            result(4, 4, 3),  // 100
        ];
        let overview = ResultOverview::from_history(&history);

        assert_eq!(overview.attempts, 4);
        assert_eq!(overview.overall_percentage, 63); // 62.5
        assert_eq!(overview.active_days, 3);
        assert_eq!(overview.recent.len(), 3);
        assert_eq!(overview.recent[0].percentage(), 100);
        assert_eq!(overview.recent[2].percentage(), 75);
        // Baseline is 75, latest is 100.
        assert_eq!(overview.trend, PerformanceTrend::Improving);
    }

    #[test]
    fn trend_uses_threshold() {
        let declining = [result(4, 4, 0), result(3, 4, 1)];
        assert_eq!(trend_of(&declining), PerformanceTrend::Declining);

        let flat = [result(20, 25, 0), result(21, 25, 1)]; // 80 -> 84
        assert_eq!(trend_of(&flat), PerformanceTrend::Stable);

        assert_eq!(trend_of(&[result(1, 4, 0)]), PerformanceTrend::Stable);
    }

    #[test]
    fn trend_needs_more_than_five_points() {
        // 50 -> 55 and 55 -> 50 sit exactly on the threshold.
        assert_eq!(trend_of(&[result(10, 20, 0), result(11, 20, 1)]), PerformanceTrend::Stable);
        assert_eq!(trend_of(&[result(11, 20, 0), result(10, 20, 1)]), PerformanceTrend::Stable);

        // 50 -> 56 and 56 -> 50 cross it.
        assert_eq!(trend_of(&[result(25, 50, 0), result(28, 50, 1)]), PerformanceTrend::Improving);
        assert_eq!(trend_of(&[result(28, 50, 0), result(25, 50, 1)]), PerformanceTrend::Declining);
    }

    #[tokio::test]
    async fn history_requires_a_profile() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = ResultHistoryService::new(repo.clone());
        let id = PrincipalId::new("learner-1").unwrap();

        let err = service.history(&id).await.unwrap_err();
        assert!(matches!(err, SessionError::ProfileNotFound(ref p) if *p == id));

        repo.upsert_profile(&Profile::new(id.clone())).await.unwrap();
        repo.merge_quiz_results(&id, &[result(1, 2, 0), result(2, 2, 1)])
            .await
            .unwrap();

        let history = service.history(&id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].score(), 1);

        let overview = service.overview(&id).await.unwrap();
        assert_eq!(overview.overall_percentage, 75);
        assert_eq!(overview.trend, PerformanceTrend::Improving);
    }
}
