use std::sync::Arc;

use log::info;
use quiz_core::model::{PrincipalId, QuizResult};
use storage::repository::{ProfileRepository, StorageError};

use crate::error::ProfileError;

/// Appends scored results to a learner's profile history.
#[derive(Clone)]
pub struct ResultPersister {
    profiles: Arc<dyn ProfileRepository>,
}

impl ResultPersister {
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(storage::repository::InMemoryRepository::new()))
    }

    /// Append `result` to the principal's history.
    ///
    /// Uses the store's atomic append, so results from concurrent sessions for
    /// the same learner are all kept. Repeated calls append repeated records;
    /// nothing is deduplicated.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::ProfileNotFound` if the principal has no profile,
    /// or `ProfileError::Storage` on repository failures.
    pub async fn persist(
        &self,
        principal: &PrincipalId,
        result: &QuizResult,
    ) -> Result<(), ProfileError> {
        self.profiles
            .append_quiz_result(principal, result)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => ProfileError::ProfileNotFound(principal.clone()),
                other => ProfileError::Storage(other),
            })?;

        info!(
            "stored quiz result {}/{} for {principal}",
            result.score(),
            result.total()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Profile;
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn result(score: u32) -> QuizResult {
        QuizResult::from_persisted(score, 4, u8::try_from(score * 25).unwrap(), fixed_now()).unwrap()
    }

    #[tokio::test]
    async fn appends_to_existing_history() {
        let repo = Arc::new(InMemoryRepository::new());
        let id = PrincipalId::new("u1").unwrap();
        repo.upsert_profile(&Profile::new(id.clone()).with_email("u1@example.com"))
            .await
            .unwrap();
        let persister = ResultPersister::new(repo.clone());

        persister.persist(&id, &result(1)).await.unwrap();
        persister.persist(&id, &result(3)).await.unwrap();

        let profile = repo.get_profile(&id).await.unwrap().unwrap();
        let scores: Vec<_> = profile.quiz_results().iter().map(QuizResult::score).collect();
        assert_eq!(scores, vec![1, 3]);
        assert_eq!(profile.email(), Some("u1@example.com"));
    }

    /// Yields to the scheduler before every call, so joined futures interleave.
    struct Yielding(InMemoryRepository);

    #[async_trait::async_trait]
    impl ProfileRepository for Yielding {
        async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
            tokio::task::yield_now().await;
            self.0.upsert_profile(profile).await
        }

        async fn get_profile(&self, id: &PrincipalId) -> Result<Option<Profile>, StorageError> {
            tokio::task::yield_now().await;
            self.0.get_profile(id).await
        }

        async fn merge_quiz_results(
            &self,
            id: &PrincipalId,
            results: &[QuizResult],
        ) -> Result<(), StorageError> {
            tokio::task::yield_now().await;
            self.0.merge_quiz_results(id, results).await
        }

        async fn append_quiz_result(
            &self,
            id: &PrincipalId,
            result: &QuizResult,
        ) -> Result<(), StorageError> {
            tokio::task::yield_now().await;
            self.0.append_quiz_result(id, result).await
        }
    }

    #[tokio::test]
    async fn concurrent_sessions_keep_both_results() {
        let inner = InMemoryRepository::new();
        let id = PrincipalId::new("u2").unwrap();
        inner.upsert_profile(&Profile::new(id.clone())).await.unwrap();
        let repo: Arc<dyn ProfileRepository> = Arc::new(Yielding(inner.clone()));
        let first_tab = ResultPersister::new(Arc::clone(&repo));
        let second_tab = ResultPersister::new(repo);

        let (r1, r4) = (result(1), result(4));
        let (a, b) = tokio::join!(
            first_tab.persist(&id, &r1),
            second_tab.persist(&id, &r4),
        );
        a.unwrap();
        b.unwrap();

        let profile = inner.get_profile(&id).await.unwrap().unwrap();
        let mut scores: Vec<_> = profile.quiz_results().iter().map(QuizResult::score).collect();
        scores.sort_unstable();
        assert_eq!(scores, vec![1, 4]);
    }

    #[tokio::test]
    async fn missing_profile_is_reported() {
        let persister = ResultPersister::in_memory();
        let id = PrincipalId::new("ghost").unwrap();
        let err = persister.persist(&id, &result(2)).await.unwrap_err();
        assert!(matches!(err, ProfileError::ProfileNotFound(p) if p == id));
    }
}
