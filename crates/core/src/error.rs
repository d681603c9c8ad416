use thiserror::Error;

use crate::model::{DocumentError, PrincipalIdError, QuestionError, QuizError, QuizResultError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    QuizResult(#[from] QuizResultError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    PrincipalId(#[from] PrincipalIdError),
}
