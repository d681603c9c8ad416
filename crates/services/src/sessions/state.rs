use quiz_core::model::{AnswerMap, Document, PrincipalId, Quiz, QuizResult};

use super::navigation::NavigationTracker;

/// Externally visible state of a quiz session. Exactly one variant is active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingDocument(Document),
    Generating(Document),
    InProgress(NavigationTracker),
    Submitted {
        quiz: Quiz,
        answers: AnswerMap,
        result: QuizResult,
    },
    Failed {
        reason: String,
    },
}

impl SessionState {
    /// Stable name of the active variant, used in transition errors and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingDocument(_) => "awaiting a document",
            Self::Generating(_) => "generating",
            Self::InProgress(_) => "in progress",
            Self::Submitted { .. } => "submitted",
            Self::Failed { .. } => "failed",
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub fn is_generating(&self) -> bool {
        matches!(self, Self::Generating(_))
    }

    /// The navigation state while a quiz is being taken.
    #[must_use]
    pub fn in_progress(&self) -> Option<&NavigationTracker> {
        match self {
            Self::InProgress(tracker) => Some(tracker),
            _ => None,
        }
    }

    /// The scored result once submitted.
    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        match self {
            Self::Submitted { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Why a scored result was not written to the profile store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No learner is signed in.
    NoPrincipal,
    /// The quiz had no questions, so there is no meaningful score to record.
    EmptyQuiz,
}

/// Outcome of the best-effort write that follows a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceStatus {
    Persisted,
    Skipped(SkipReason),
    ProfileNotFound(PrincipalId),
    Failed(String),
}

impl PersistenceStatus {
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }
}

/// Returned by `submit`: the score is always present, persistence may have failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub result: QuizResult,
    pub persistence: PersistenceStatus,
}

/// Returned by `generate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// The quiz is loaded and the session is in progress.
    Ready { questions: usize },
    /// The session was restarted or given a new document while the request
    /// was in flight; the response was dropped.
    Discarded,
}
