use quiz_core::model::{AnswerMap, Question, Quiz};

use super::progress::SessionProgress;
use crate::error::SessionError;

/// Current question and captured answers for a quiz being taken.
///
/// Boundary moves are clamped no-ops; answer selection is strict about the
/// question index and label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTracker {
    quiz: Quiz,
    answers: AnswerMap,
    current: usize,
}

impl NavigationTracker {
    #[must_use]
    pub fn new(quiz: Quiz) -> Self {
        Self {
            quiz,
            answers: AnswerMap::new(),
            current: 0,
        }
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question at the current index, or `None` for an empty quiz.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.get(self.current)
    }

    #[must_use]
    pub fn answer_for(&self, index: usize) -> Option<&str> {
        self.answers.get(index)
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.quiz.len()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress::new(self.quiz.len(), self.answers.len(), self.current)
    }

    /// Record `label` as the answer to question `index`. The current index is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidInput` if `index` is outside the quiz or
    /// `label` is not one of the question's option labels.
    pub fn select_answer(&mut self, index: usize, label: &str) -> Result<(), SessionError> {
        let question = self.quiz.get(index).ok_or_else(|| {
            SessionError::InvalidInput(format!(
                "question index {index} out of range for {} questions",
                self.quiz.len()
            ))
        })?;
        if !question.has_label(label) {
            return Err(SessionError::InvalidInput(format!(
                "{label:?} is not an option of question {}",
                index + 1
            )));
        }
        self.answers.select(index, label);
        Ok(())
    }

    /// Advance one question; stays put on the last question.
    pub fn next(&mut self) -> usize {
        if self.current + 1 < self.quiz.len() {
            self.current += 1;
        }
        self.current
    }

    /// Go back one question; stays put on the first question.
    pub fn previous(&mut self) -> usize {
        self.current = self.current.saturating_sub(1);
        self.current
    }

    pub(crate) fn into_parts(self) -> (Quiz, AnswerMap) {
        (self.quiz, self.answers)
    }
}
