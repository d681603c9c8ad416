use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Every generated question offers exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("expected 4 options, found {found}")]
    WrongOptionCount { found: usize },

    #[error("option cannot be empty")]
    EmptyOption,

    #[error("duplicate option label: {0}")]
    DuplicateLabel(String),

    #[error("correct answer {0:?} does not match any option label")]
    UnknownAnswer(String),
}

//
// ─── OPTION ────────────────────────────────────────────────────────────────────
//

/// One labeled choice, e.g. label `B` with text `4`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    pub text: String,
}

impl QuestionOption {
    #[must_use]
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Split `"B) 4"`, `"c. Paris"` or `"D: none"` into an upper-cased label and its text.
///
/// Only a single ASCII letter followed by `)`, `.`, `:` or `-` counts as a label.
fn split_label(raw: &str) -> Option<(String, &str)> {
    let mut chars = raw.chars();
    let first = chars.next().filter(char::is_ascii_alphabetic)?;
    let rest = chars.as_str().trim_start();
    let rest = rest.strip_prefix([')', '.', ':', '-'])?;
    Some((first.to_ascii_uppercase().to_string(), rest.trim()))
}

/// Turn generator option strings into labeled options.
///
/// Prefixed options keep their own labels when every option has one and no two
/// collide. Otherwise options are labeled `A` to `D` by position and keep their
/// full text, so `["3", "4", "5", "6"]` and `["Paris", "Prague", ...]` both work.
fn parse_options<S: AsRef<str>>(raw: &[S]) -> Result<Vec<QuestionOption>, QuestionError> {
    if raw.len() != OPTIONS_PER_QUESTION {
        return Err(QuestionError::WrongOptionCount { found: raw.len() });
    }
    let trimmed: Vec<&str> = raw.iter().map(|r| r.as_ref().trim()).collect();
    if trimmed.iter().any(|r| r.is_empty()) {
        return Err(QuestionError::EmptyOption);
    }

    let prefixed: Option<Vec<(String, &str)>> = trimmed.iter().map(|r| split_label(r)).collect();
    if let Some(prefixed) = prefixed {
        let labels: HashSet<&str> = prefixed.iter().map(|(label, _)| label.as_str()).collect();
        if labels.len() == prefixed.len() && prefixed.iter().all(|(_, text)| !text.is_empty()) {
            return Ok(prefixed
                .into_iter()
                .map(|(label, text)| QuestionOption::new(label, text))
                .collect());
        }
    }

    Ok(('A'..='D')
        .zip(trimmed)
        .map(|(label, text)| QuestionOption::new(label.to_string(), text))
        .collect())
}

/// Resolve a generator answer to one of `options`' labels.
///
/// Accepts the option text itself (`"Paris"`), a prefixed label (`"B) 4"`), or a
/// bare label (`"b"`).
fn resolve_answer(options: &[QuestionOption], raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Some(option) = options.iter().find(|o| o.text.eq_ignore_ascii_case(raw)) {
        return Some(option.label.clone());
    }
    if let Some((label, _)) = split_label(raw) {
        return Some(label);
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c.to_uppercase().collect()),
        _ => None,
    }
}

/// Unvalidated wire shape; deserializing a `Question` goes through `Question::new`.
#[derive(Deserialize)]
struct QuestionRecord {
    text: String,
    options: Vec<QuestionOption>,
    correct_answer: String,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Self::new(record.text, record.options, record.correct_answer)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord")]
pub struct Question {
    text: String,
    options: [QuestionOption; OPTIONS_PER_QUESTION],
    correct_answer: String,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, the option count is not
    /// four, labels repeat, or `correct_answer` matches no label.
    pub fn new(
        text: impl Into<String>,
        options: Vec<QuestionOption>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into().trim().to_owned();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let found = options.len();
        let options: [QuestionOption; OPTIONS_PER_QUESTION] = options
            .try_into()
            .map_err(|_| QuestionError::WrongOptionCount { found })?;

        let mut seen = HashSet::with_capacity(OPTIONS_PER_QUESTION);
        for option in &options {
            if option.label.is_empty() {
                return Err(QuestionError::EmptyOption);
            }
            if !seen.insert(option.label.as_str()) {
                return Err(QuestionError::DuplicateLabel(option.label.clone()));
            }
        }

        let correct_answer = correct_answer.into();
        if !seen.contains(correct_answer.as_str()) {
            return Err(QuestionError::UnknownAnswer(correct_answer));
        }

        Ok(Self {
            text,
            options,
            correct_answer,
        })
    }

    /// Build a question from the generator's raw strings.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if any option is blank or the assembled question
    /// fails validation.
    pub fn from_raw<S: AsRef<str>>(
        text: &str,
        options: &[S],
        answer: &str,
    ) -> Result<Self, QuestionError> {
        let options = parse_options(options)?;
        let answer = resolve_answer(&options, answer)
            .ok_or_else(|| QuestionError::UnknownAnswer(answer.trim().to_owned()))?;
        Self::new(text, options, answer)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[QuestionOption] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.options.iter().any(|o| o.label == label)
    }

    #[must_use]
    pub fn is_correct(&self, label: &str) -> bool {
        self.correct_answer == label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abcd() -> Vec<QuestionOption> {
        vec![
            QuestionOption::new("A", "3"),
            QuestionOption::new("B", "4"),
            QuestionOption::new("C", "5"),
            QuestionOption::new("D", "6"),
        ]
    }

    #[test]
    fn prefixed_options_keep_their_labels() {
        let options = ["A) 3", "  b. 4 ", "C: 5", "d - 6"];
        let q = Question::from_raw("What is 2+2?", options.as_slice(), " b ").unwrap();
        assert_eq!(q.options()[1], QuestionOption::new("B", "4"));
        assert_eq!(q.options()[3], QuestionOption::new("D", "6"));
        assert_eq!(q.correct_answer(), "B");
        assert!(q.is_correct("B"));
        assert!(!q.is_correct("A"));
        assert!(q.has_label("D"));
    }

    #[test]
    fn unprefixed_options_are_labeled_by_position() {
        let options = ["3", "4", "5", "6"];
        let q = Question::from_raw("What is 2+2?", options.as_slice(), "B").unwrap();
        assert_eq!(q.options()[0], QuestionOption::new("A", "3"));
        assert_eq!(q.options()[1], QuestionOption::new("B", "4"));
        assert_eq!(q.correct_answer(), "B");

        let capitals = ["Paris", "Prague", "Pretoria", "Porto"];
        let q = Question::from_raw("Capital of France?", capitals.as_slice(), "a").unwrap();
        assert_eq!(q.options()[0], QuestionOption::new("A", "Paris"));
        assert_eq!(q.options()[3], QuestionOption::new("D", "Porto"));
        assert_eq!(q.correct_answer(), "A");
    }

    #[test]
    fn answer_may_name_the_option_text_or_prefix() {
        let capitals = ["Paris", "Prague", "Pretoria", "Porto"];
        let q = Question::from_raw("Capital of Czechia?", capitals.as_slice(), "prague").unwrap();
        assert_eq!(q.correct_answer(), "B");

        let options = ["A) 3", "B) 4", "C) 5", "D) 6"];
        let q = Question::from_raw("What is 2+3?", options.as_slice(), "C) 5").unwrap();
        assert_eq!(q.correct_answer(), "C");

        let err = Question::from_raw("Q", options.as_slice(), "Berlin").unwrap_err();
        assert_eq!(err, QuestionError::UnknownAnswer("Berlin".into()));
    }

    #[test]
    fn colliding_prefixes_fall_back_to_positions() {
        let options = ["U.S. Army", "U.K. Navy", "E.U. Council", "N.Z. Police"];
        let q = Question::from_raw("Which is American?", options.as_slice(), "A").unwrap();
        assert_eq!(q.options()[0], QuestionOption::new("A", "U.S. Army"));
        assert_eq!(q.options()[2], QuestionOption::new("C", "E.U. Council"));
    }

    #[test]
    fn from_raw_rejects_blank_or_missing_options() {
        let blank = ["3", "  ", "5", "6"];
        assert_eq!(
            Question::from_raw("Q", blank.as_slice(), "A").unwrap_err(),
            QuestionError::EmptyOption
        );
        let short = ["3", "4", "5"];
        assert_eq!(
            Question::from_raw("Q", short.as_slice(), "A").unwrap_err(),
            QuestionError::WrongOptionCount { found: 3 }
        );
    }

    #[test]
    fn deserializing_validates() {
        let ok = r#"{"text":"Q","options":[
            {"label":"A","text":"1"},{"label":"B","text":"2"},
            {"label":"C","text":"3"},{"label":"D","text":"4"}],"correct_answer":"C"}"#;
        let q: Question = serde_json::from_str(ok).unwrap();
        assert_eq!(q.correct_answer(), "C");

        let bad = r#"{"text":"Q","options":[
            {"label":"A","text":"1"},{"label":"B","text":"2"},
            {"label":"C","text":"3"},{"label":"D","text":"4"}],"correct_answer":"E"}"#;
        assert!(serde_json::from_str::<Question>(bad).is_err());

        let three = r#"{"text":"Q","options":[
            {"label":"A","text":"1"},{"label":"B","text":"2"},
            {"label":"C","text":"3"}],"correct_answer":"A"}"#;
        assert!(serde_json::from_str::<Question>(three).is_err());
    }

    #[test]
    fn rejects_wrong_option_count() {
        let mut options = abcd();
        options.pop();
        let err = Question::new("Q", options, "A").unwrap_err();
        assert_eq!(err, QuestionError::WrongOptionCount { found: 3 });
    }

    #[test]
    fn rejects_duplicate_labels() {
        let mut options = abcd();
        options[3].label = "A".into();
        let err = Question::new("Q", options, "A").unwrap_err();
        assert_eq!(err, QuestionError::DuplicateLabel("A".into()));
    }

    #[test]
    fn rejects_answer_without_matching_label() {
        let err = Question::new("Q", abcd(), "E").unwrap_err();
        assert_eq!(err, QuestionError::UnknownAnswer("E".into()));
    }

    #[test]
    fn rejects_blank_text() {
        let err = Question::new("  ", abcd(), "A").unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);
    }
}
