use async_trait::async_trait;
use quiz_core::model::{PrincipalId, Profile, QuizResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for learner profiles and their quiz history.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Create a profile or update its identity fields (name, email).
    ///
    /// The quiz history of an existing profile is left untouched; a new
    /// profile starts with an empty history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError>;

    /// Fetch a profile with its full quiz history, oldest result first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures. A missing profile is `Ok(None)`.
    async fn get_profile(&self, id: &PrincipalId) -> Result<Option<Profile>, StorageError>;

    /// Replace the quiz history of an existing profile in one write.
    ///
    /// No other profile field is modified.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the profile does not exist, or other storage errors.
    async fn merge_quiz_results(
        &self,
        id: &PrincipalId,
        results: &[QuizResult],
    ) -> Result<(), StorageError>;

    /// Append one result to the end of an existing profile's history.
    ///
    /// Atomic with respect to other appends for the same profile, so concurrent
    /// sessions never overwrite each other's results.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the profile does not exist, or other storage errors.
    async fn append_quiz_result(
        &self,
        id: &PrincipalId,
        result: &QuizResult,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    profiles: Arc<Mutex<HashMap<PrincipalId, Profile>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let mut guard = self
            .profiles
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let history = guard
            .get(profile.principal_id())
            .map(|existing| existing.quiz_results().to_vec())
            .unwrap_or_default();
        guard.insert(
            profile.principal_id().clone(),
            profile.clone().with_quiz_results(history),
        );
        Ok(())
    }

    async fn get_profile(&self, id: &PrincipalId) -> Result<Option<Profile>, StorageError> {
        let guard = self
            .profiles
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(id).cloned())
    }

    async fn merge_quiz_results(
        &self,
        id: &PrincipalId,
        results: &[QuizResult],
    ) -> Result<(), StorageError> {
        let mut guard = self
            .profiles
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let profile = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        *profile = profile.clone().with_quiz_results(results.to_vec());
        Ok(())
    }

    async fn append_quiz_result(
        &self,
        id: &PrincipalId,
        result: &QuizResult,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .profiles
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let profile = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        let mut history = profile.quiz_results().to_vec();
        history.push(result.clone());
        *profile = profile.clone().with_quiz_results(history);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let profiles: Arc<dyn ProfileRepository> = Arc::new(InMemoryRepository::new());
        Self { profiles }
    }
}
