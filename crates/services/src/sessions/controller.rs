use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use quiz_core::model::{Document, PrincipalId, QuizResult};
use quiz_core::{Clock, ScoringEngine};

use super::navigation::NavigationTracker;
use super::persister::ResultPersister;
use super::progress::SessionProgress;
use super::state::{GenerateOutcome, PersistenceStatus, SessionState, SkipReason, SubmissionReceipt};
use crate::error::{ProfileError, SessionError};
use crate::generation_service::QuizGenerator;

//
// ─── INNER STATE ───────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Inner {
    state: SessionState,
    last_document: Option<Document>,
    persistence: Option<PersistenceStatus>,
    /// Bumped whenever the session is reset, so in-flight work can tell it is stale.
    epoch: u64,
}

impl Inner {
    fn reject(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            operation,
            state: self.state.name(),
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!("session: {} -> {}", self.state.name(), next.name());
        self.state = next;
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// State machine for one learner's quiz activity.
///
/// Generate a quiz from a document, answer it, submit it for scoring, and
/// record the result against the signed-in learner.
///
/// Every operation is atomic from the caller's point of view. The internal lock
/// is only held for synchronous transitions, never across the generation or
/// persistence requests, so a second `generate` while one is in flight is
/// rejected rather than queued.
pub struct SessionController {
    generator: Arc<dyn QuizGenerator>,
    persister: ResultPersister,
    clock: Clock,
    principal: Option<PrincipalId>,
    inner: Mutex<Inner>,
}

impl SessionController {
    #[must_use]
    pub fn new(generator: Arc<dyn QuizGenerator>, persister: ResultPersister, clock: Clock) -> Self {
        Self {
            generator,
            persister,
            clock,
            principal: None,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Record results against `principal`. Without one, results are scored but not stored.
    #[must_use]
    pub fn with_principal(mut self, principal: PrincipalId) -> Self {
        self.principal = Some(principal);
        self
    }

    #[must_use]
    pub fn principal(&self) -> Option<&PrincipalId> {
        self.principal.as_ref()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        // No transition can panic halfway, so a poisoned lock still holds a valid state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current_state(&self) -> SessionState {
        self.inner().state.clone()
    }

    /// Progress through the quiz while one is in progress.
    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        self.inner()
            .state
            .in_progress()
            .map(NavigationTracker::progress)
    }

    /// Persistence outcome of the last submission, until the session is reset.
    #[must_use]
    pub fn last_persistence(&self) -> Option<PersistenceStatus> {
        self.inner().persistence.clone()
    }

    /// Choose the document to generate a quiz from.
    ///
    /// Discards any quiz, answers or result from a previous attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` while a quiz is being generated.
    pub fn select_document(&self, document: Document) -> Result<(), SessionError> {
        let mut inner = self.inner();
        if inner.state.is_generating() {
            return Err(inner.reject("select a document"));
        }
        info!("selected document {} ({} bytes)", document.file_name(), document.len());
        inner.epoch += 1;
        inner.persistence = None;
        inner.last_document = Some(document.clone());
        inner.transition(SessionState::AwaitingDocument(document));
        Ok(())
    }

    /// Request a quiz for the selected document.
    ///
    /// If the session is restarted or handed a new document before the
    /// response arrives, the response is dropped and `Discarded` is returned.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless a document is awaiting
    /// generation (including while another generation is in flight), and
    /// `SessionError::GenerationFailed` when the generator fails; the session is
    /// then `Failed` and can be retried.
    pub async fn generate(&self) -> Result<GenerateOutcome, SessionError> {
        let (document, epoch) = {
            let mut inner = self.inner();
            let SessionState::AwaitingDocument(document) = &inner.state else {
                return Err(inner.reject("generate"));
            };
            let document = document.clone();
            inner.epoch += 1;
            inner.transition(SessionState::Generating(document.clone()));
            (document, inner.epoch)
        };

        let outcome = self.generator.request_quiz(&document).await;

        let mut inner = self.inner();
        if inner.epoch != epoch || !inner.state.is_generating() {
            warn!(
                "discarding quiz response for {}; session moved on",
                document.file_name()
            );
            return Ok(GenerateOutcome::Discarded);
        }

        match outcome {
            Ok(quiz) => {
                let questions = quiz.len();
                if quiz.is_empty() {
                    warn!("quiz service returned no questions for {}", document.file_name());
                }
                inner.transition(SessionState::InProgress(NavigationTracker::new(quiz)));
                Ok(GenerateOutcome::Ready { questions })
            }
            Err(err) => {
                let reason = err.to_string();
                warn!("quiz generation failed for {}: {reason}", document.file_name());
                inner.transition(SessionState::Failed {
                    reason: reason.clone(),
                });
                Err(SessionError::GenerationFailed(reason))
            }
        }
    }

    /// Record an answer for question `index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless a quiz is in progress,
    /// and `SessionError::InvalidInput` for an unknown index or label.
    pub fn select_answer(&self, index: usize, label: &str) -> Result<(), SessionError> {
        let mut inner = self.inner();
        match &mut inner.state {
            SessionState::InProgress(tracker) => tracker.select_answer(index, label),
            _ => Err(inner.reject("select an answer")),
        }
    }

    /// Move to the next question, staying on the last one. Returns the new index.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless a quiz is in progress.
    pub fn next(&self) -> Result<usize, SessionError> {
        let mut inner = self.inner();
        match &mut inner.state {
            SessionState::InProgress(tracker) => Ok(tracker.next()),
            _ => Err(inner.reject("go to the next question")),
        }
    }

    /// Move to the previous question, staying on the first one. Returns the new index.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless a quiz is in progress.
    pub fn previous(&self) -> Result<usize, SessionError> {
        let mut inner = self.inner();
        match &mut inner.state {
            SessionState::InProgress(tracker) => Ok(tracker.previous()),
            _ => Err(inner.reject("go to the previous question")),
        }
    }

    /// Score the quiz and record the result against the signed-in learner.
    ///
    /// The session is `Submitted` before the result is written, so a storage
    /// failure never hides the score; it is reported in the receipt instead.
    /// Unanswered questions count as wrong.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless a quiz is in progress,
    /// which also rejects a second submission.
    pub async fn submit(&self) -> Result<SubmissionReceipt, SessionError> {
        let (result, epoch) = {
            let mut inner = self.inner();
            let tracker = match std::mem::take(&mut inner.state) {
                SessionState::InProgress(tracker) => tracker,
                other => {
                    inner.state = other;
                    return Err(inner.reject("submit"));
                }
            };
            let (quiz, answers) = tracker.into_parts();
            let result = ScoringEngine::score(&quiz, &answers, self.clock.now());
            info!(
                "quiz submitted: {}/{} ({}%)",
                result.score(),
                result.total(),
                result.percentage()
            );
            inner.transition(SessionState::Submitted {
                quiz,
                answers,
                result: result.clone(),
            });
            (result, inner.epoch)
        };

        let persistence = self.persist(&result).await;

        let mut inner = self.inner();
        if inner.epoch == epoch {
            inner.persistence = Some(persistence.clone());
        }
        Ok(SubmissionReceipt {
            result,
            persistence,
        })
    }

    async fn persist(&self, result: &QuizResult) -> PersistenceStatus {
        if result.total() == 0 {
            debug!("empty quiz submitted; nothing to record");
            return PersistenceStatus::Skipped(SkipReason::EmptyQuiz);
        }
        let Some(principal) = &self.principal else {
            warn!("no learner signed in; quiz result not recorded");
            return PersistenceStatus::Skipped(SkipReason::NoPrincipal);
        };

        match self.persister.persist(principal, result).await {
            Ok(()) => PersistenceStatus::Persisted,
            Err(ProfileError::ProfileNotFound(id)) => {
                warn!("no profile for {id}; quiz result not recorded");
                PersistenceStatus::ProfileNotFound(id)
            }
            Err(err) => {
                warn!("failed to record quiz result for {principal}: {err}");
                PersistenceStatus::Failed(err.to_string())
            }
        }
    }

    /// Return to `Idle` from any state, dropping the quiz, answers, result and document.
    ///
    /// A generation still in flight will have its response discarded.
    pub fn restart(&self) {
        let mut inner = self.inner();
        inner.epoch += 1;
        inner.persistence = None;
        inner.last_document = None;
        inner.transition(SessionState::Idle);
    }

    /// After a failed generation, go back to awaiting the same document.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is `Failed`.
    pub fn retry(&self) -> Result<(), SessionError> {
        let mut inner = self.inner();
        if !matches!(inner.state, SessionState::Failed { .. }) {
            return Err(inner.reject("retry"));
        }
        let Some(document) = inner.last_document.clone() else {
            return Err(inner.reject("retry without a document"));
        };
        inner.transition(SessionState::AwaitingDocument(document));
        Ok(())
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner();
        f.debug_struct("SessionController")
            .field("state", &inner.state.name())
            .field("principal", &self.principal)
            .field("clock", &self.clock)
            .field("epoch", &inner.epoch)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
