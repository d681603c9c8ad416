use std::collections::BTreeMap;

/// Selected label per question index. Absent keys are unanswered questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerMap {
    selected: BTreeMap<usize, String>,
}

impl AnswerMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.selected.get(&index).map(String::as_str)
    }

    /// Record or overwrite the label chosen for `index`.
    pub fn select(&mut self, index: usize, label: impl Into<String>) {
        self.selected.insert(index, label.into());
    }

    /// Number of answered questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Answers in ascending question order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.selected.iter().map(|(i, label)| (*i, label.as_str()))
    }
}

impl<L: Into<String>> FromIterator<(usize, L)> for AnswerMap {
    fn from_iter<T: IntoIterator<Item = (usize, L)>>(iter: T) -> Self {
        let mut answers = Self::new();
        for (index, label) in iter {
            answers.select(index, label);
        }
        answers
    }
}
