use quiz_core::scoring::rounded_percentage;

/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    /// 1-based position of the current question; 0 for an empty quiz.
    pub position: usize,
    /// `round(100 * position / total)`, 0 for an empty quiz.
    pub percent_complete: u8,
}

impl SessionProgress {
    pub(crate) fn new(total: usize, answered: usize, current_index: usize) -> Self {
        let position = if total == 0 { 0 } else { current_index + 1 };
        Self {
            total,
            answered,
            position,
            percent_complete: rounded_percentage(position as u64, total as u64),
        }
    }
}
