use crossword_core::model::{CellKey, CrosswordId, HINT_BUDGET, ProgressId};
use crossword_core::time::secs_to_interval;

/// Dialog the play page should show once the attempt is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalDialog {
    Completed,
    Failed,
    Expired,
}

/// Everything the play page renders, published after every session event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub crossword_id: CrosswordId,
    pub progress_id: Option<ProgressId>,
    pub title: String,
    pub description: Option<String>,
    pub time_limit_secs: u32,
    pub elapsed_secs: u32,
    pub time_remaining_secs: u32,
    pub time_expired: bool,
    pub completed: bool,
    pub failed: bool,
    pub hints_used: usize,
    pub no_hints_left: bool,
    /// False when the stored answers could not be read back.
    pub valid_guesses: bool,
    /// Remote writes are still in flight.
    pub saving: bool,
    /// Grid cells with the current guess, row by row.
    pub cells: Vec<(CellKey, Option<char>)>,
}

impl SessionView {
    /// Countdown label, `HH:MM:SS`.
    #[must_use]
    pub fn time_remaining_label(&self) -> String {
        secs_to_interval(self.time_remaining_secs)
    }

    /// Hearts left to spend on hints.
    #[must_use]
    pub fn hints_remaining(&self) -> usize {
        HINT_BUDGET.saturating_sub(self.hints_used)
    }

    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.time_limit_secs > 0
    }

    /// Side length of the square grid.
    #[must_use]
    pub fn grid_size(&self) -> u32 {
        self.cells
            .iter()
            .map(|(cell, _)| cell.row.max(cell.col) + 1)
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn dialog(&self) -> Option<TerminalDialog> {
        if self.completed {
            Some(TerminalDialog::Completed)
        } else if self.failed {
            Some(TerminalDialog::Failed)
        } else if self.time_expired {
            Some(TerminalDialog::Expired)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> SessionView {
        SessionView {
            crossword_id: CrosswordId::new(1),
            progress_id: Some(ProgressId::new(1)),
            title: "Scrum".into(),
            description: None,
            time_limit_secs: 120,
            elapsed_secs: 55,
            time_remaining_secs: 65,
            time_expired: false,
            completed: false,
            failed: false,
            hints_used: 1,
            no_hints_left: false,
            valid_guesses: true,
            saving: false,
            cells: vec![
                (CellKey::new(0, 0), Some('S')),
                (CellKey::new(0, 1), None),
                (CellKey::new(2, 0), None),
            ],
        }
    }

    #[test]
    fn completed_dialog_wins_over_failure() {
        let mut v = view();
        assert_eq!(v.dialog(), None);
        v.time_expired = true;
        assert_eq!(v.dialog(), Some(TerminalDialog::Expired));
        v.failed = true;
        assert_eq!(v.dialog(), Some(TerminalDialog::Failed));
        v.completed = true;
        assert_eq!(v.dialog(), Some(TerminalDialog::Completed));
    }

    #[test]
    fn labels_and_hearts() {
        let v = view();
        assert_eq!(v.time_remaining_label(), "00:01:05");
        assert_eq!(v.hints_remaining(), 2);
        assert_eq!(v.grid_size(), 3);
    }
}
