use std::ops::Index;
use std::sync::Arc;
use thiserror::Error;

use crate::model::Question;

/// Upper bound on questions kept from a single generation.
pub const MAX_QUESTIONS: usize = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("too many questions for a single quiz: {len}")]
    TooManyQuestions { len: usize },
}

/// Ordered, immutable list of questions produced by one generation.
///
/// Clones share the same backing slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    questions: Arc<[Question]>,
}

impl Quiz {
    /// # Errors
    ///
    /// Returns `QuizError::TooManyQuestions` if more than `MAX_QUESTIONS` are given.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.len() > MAX_QUESTIONS {
            return Err(QuizError::TooManyQuestions {
                len: questions.len(),
            });
        }
        Ok(Self {
            questions: questions.into(),
        })
    }

    /// A quiz with no questions, produced when the generator returns no list.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            questions: Arc::from(Vec::<Question>::new()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }
}

impl Index<usize> for Quiz {
    type Output = Question;

    fn index(&self, index: usize) -> &Self::Output {
        &self.questions[index]
    }
}

impl<'a> IntoIterator for &'a Quiz {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionOption;

    fn question(n: usize) -> Question {
        Question::new(
            format!("Q{n}"),
            vec![
                QuestionOption::new("A", "a"),
                QuestionOption::new("B", "b"),
                QuestionOption::new("C", "c"),
                QuestionOption::new("D", "d"),
            ],
            "A",
        )
        .unwrap()
    }

    #[test]
    fn accepts_up_to_max_questions() {
        let quiz = Quiz::new((0..MAX_QUESTIONS).map(question).collect()).unwrap();
        assert_eq!(quiz.len(), MAX_QUESTIONS);
        assert_eq!(quiz[0].text(), "Q0");

        let err = Quiz::new((0..=MAX_QUESTIONS).map(question).collect()).unwrap_err();
        assert_eq!(err, QuizError::TooManyQuestions { len: MAX_QUESTIONS + 1 });
    }

    #[test]
    fn clones_share_questions() {
        let quiz = Quiz::new(vec![question(1), question(2)]).unwrap();
        let copy = quiz.clone();
        assert!(Arc::ptr_eq(&quiz.questions, &copy.questions));
        assert!(Quiz::empty().is_empty());
    }
}
