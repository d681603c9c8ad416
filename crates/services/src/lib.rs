#![forbid(unsafe_code)]

pub mod error;
pub mod generation_service;
pub mod history_service;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use error::{GenerationError, ProfileError, SessionError};
pub use generation_service::{
    GenerationConfig, HttpQuizGenerator, QuizGenerator, parse_quiz_response,
};
pub use history_service::{PerformanceTrend, ResultHistoryService, ResultOverview};

pub use sessions::{
    GenerateOutcome, NavigationTracker, PersistenceStatus, ResultPersister, SessionController,
    SessionProgress, SessionState, SkipReason, SubmissionReceipt,
};
