use serde::{Deserialize, Serialize};

use crate::model::{PrincipalId, QuizResult};

/// Profile record kept by the identity store.
///
/// Only `quiz_results` is ever extended by the quiz session; the other
/// fields are written at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    principal_id: PrincipalId,
    display_name: Option<String>,
    email: Option<String>,
    quiz_results: Vec<QuizResult>,
}

impl Profile {
    #[must_use]
    pub fn new(principal_id: PrincipalId) -> Self {
        Self {
            principal_id,
            display_name: None,
            email: None,
            quiz_results: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_quiz_results(mut self, results: Vec<QuizResult>) -> Self {
        self.quiz_results = results;
        self
    }

    #[must_use]
    pub fn principal_id(&self) -> &PrincipalId {
        &self.principal_id
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Result history, oldest first.
    #[must_use]
    pub fn quiz_results(&self) -> &[QuizResult] {
        &self.quiz_results
    }
}
