//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{DocumentError, PrincipalId};
use storage::repository::StorageError;

/// Errors emitted by a `QuizGenerator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("quiz service request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("quiz service returned a malformed payload: {0}")]
    Malformed(String),
}

/// Errors emitted while reading or extending a learner profile.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("no profile found for principal {0}")]
    ProfileNotFound(PrincipalId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the quiz session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// The caller passed something unusable (missing document, bad index or label).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The operation is not valid in the current session state.
    #[error("cannot {operation} while session is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },
    #[error("quiz generation failed: {0}")]
    GenerationFailed(String),
    #[error("no profile found for principal {0}")]
    ProfileNotFound(PrincipalId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<DocumentError> for SessionError {
    fn from(err: DocumentError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<ProfileError> for SessionError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::ProfileNotFound(id) => Self::ProfileNotFound(id),
            ProfileError::Storage(e) => Self::Storage(e),
        }
    }
}
