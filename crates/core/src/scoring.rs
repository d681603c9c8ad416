use chrono::{DateTime, Utc};

use crate::model::{AnswerMap, Quiz, QuizResult};

/// `round(100 * part / whole)` with halves rounded up, or 0 when `whole == 0`.
///
/// Integer arithmetic only, so results never drift from floating-point error.
#[must_use]
pub fn rounded_percentage(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 0;
    }
    let pct = (200 * part + whole) / (2 * whole);
    u8::try_from(pct.min(100)).unwrap_or(100)
}

/// Pure scoring of a submitted quiz.
///
/// # Examples
///
/// ```
/// # use quiz_core::ScoringEngine;
/// # use quiz_core::model::{AnswerMap, Question, QuestionOption, Quiz};
/// # use quiz_core::time::fixed_now;
/// let question = Question::new(
///     "What is 2+2?",
///     vec![
///         QuestionOption::new("A", "3"),
///         QuestionOption::new("B", "4"),
///         QuestionOption::new("C", "5"),
///         QuestionOption::new("D", "6"),
///     ],
///     "B",
/// )?;
/// let quiz = Quiz::new(vec![question])?;
/// let answers: AnswerMap = [(0, "B")].into_iter().collect();
///
/// let result = ScoringEngine::score(&quiz, &answers, fixed_now());
/// assert_eq!((result.score(), result.total(), result.percentage()), (1, 1, 100));
/// # Ok::<(), quiz_core::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    /// Count correct answers and derive the percentage.
    ///
    /// Total over every input: unanswered questions never match, answers for
    /// indices outside the quiz are ignored, and an empty quiz scores `0/0 = 0%`.
    #[must_use]
    pub fn score(quiz: &Quiz, answers: &AnswerMap, taken_at: DateTime<Utc>) -> QuizResult {
        let correct = quiz
            .iter()
            .enumerate()
            .filter(|(i, question)| {
                answers
                    .get(*i)
                    .is_some_and(|label| question.is_correct(label))
            })
            .count();

        // Quiz length is capped at MAX_QUESTIONS, so these always fit.
        let score = u32::try_from(correct).unwrap_or(u32::MAX);
        let total = u32::try_from(quiz.len()).unwrap_or(u32::MAX);
        let percentage = rounded_percentage(u64::from(score), u64::from(total));

        QuizResult::scored(score, total, percentage, taken_at)
    }
}
