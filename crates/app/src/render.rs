use std::collections::BTreeMap;
use std::fmt::Write as _;

use crossword_core::model::{CellKey, CluesInput, Direction, GuessSnapshot, Topic};
use crossword_core::time::secs_to_interval;
use services::{LevelEntry, LevelMenu, LevelStatus, SessionView, TerminalDialog};

use crate::tutorial;

const BLOCK: char = '#';
const EMPTY: char = '.';

/// Square grid; cells outside every answer are blocks.
#[must_use]
pub fn grid(size: u32, cells: &[(CellKey, Option<char>)]) -> String {
    let cells: BTreeMap<CellKey, Option<char>> = cells.iter().copied().collect();
    let mut out = String::from("   ");
    for col in 0..size {
        let _ = write!(out, "{:>2}", col % 100);
    }
    out.push('\n');
    for row in 0..size {
        let _ = write!(out, "{row:>2} ");
        for col in 0..size {
            let mark = match cells.get(&CellKey::new(row, col)) {
                None => BLOCK,
                Some(None) => EMPTY,
                Some(Some(letter)) => *letter,
            };
            let _ = write!(out, " {mark}");
        }
        out.push('\n');
    }
    out
}

#[must_use]
pub fn solution_grid(size: u32, solution: &GuessSnapshot) -> String {
    let cells: Vec<_> = solution
        .guesses
        .iter()
        .map(|(cell, letter)| (*cell, letter.chars().next()))
        .collect();
    grid(size, &cells)
}

#[must_use]
pub fn clues(definition: &CluesInput) -> String {
    let mut out = String::new();
    let mut current = None;
    for (direction, number, entry) in definition.clues() {
        if current != Some(direction) {
            let heading = match direction {
                Direction::Across => "Across",
                Direction::Down => "Down",
            };
            let _ = writeln!(out, "{heading}:");
            current = Some(direction);
        }
        let _ = writeln!(
            out,
            "  {number}. {} ({} letters, starts at {} {})",
            entry.clue,
            entry.answer.chars().count(),
            entry.row,
            entry.col
        );
    }
    out
}

fn hearts(view: &SessionView) -> String {
    let mut out = "♥".repeat(view.hints_remaining());
    out.push_str(&"♡".repeat(view.hints_used.min(crossword_core::model::HINT_BUDGET)));
    out
}

/// Status line plus the board.
#[must_use]
pub fn session(view: &SessionView) -> String {
    let clock = if view.is_timed() {
        format!("time left {}", view.time_remaining_label())
    } else {
        format!("untimed, {} played", secs_to_interval(view.elapsed_secs))
    };
    let mut out = format!("{}  |  {clock}  |  hints {}", view.title, hearts(view));
    if view.saving {
        out.push_str("  |  saving...");
    }
    out.push('\n');
    if !view.valid_guesses {
        out.push_str("(saved answers could not be read, starting from an empty board)\n");
    }
    out.push_str(&grid(view.grid_size(), &view.cells));
    out
}

#[must_use]
pub fn dialog(dialog: TerminalDialog) -> &'static str {
    match dialog {
        TerminalDialog::Completed => "Crossword completed. Well done!",
        TerminalDialog::Failed => "This attempt failed. Type `restart` to try again.",
        TerminalDialog::Expired => "Time is up. Type `restart` to try again.",
    }
}

fn status(entry: &LevelEntry) -> String {
    match entry.status {
        LevelStatus::NotStarted => "not started".into(),
        LevelStatus::InProgress { time_spent_secs } => {
            format!("in progress, {}", secs_to_interval(time_spent_secs))
        }
        LevelStatus::Completed => "completed".into(),
        LevelStatus::Failed => "failed".into(),
    }
}

#[must_use]
pub fn level_menu(menu: &LevelMenu) -> String {
    let mut out = format!("{} / {}\n", menu.topic, menu.difficulty);
    if !menu.tutorial_completed {
        let _ = writeln!(
            out,
            "Tutorial not read yet: run `crossword tutorial --topic {} --difficulty {}` to unlock these levels.",
            menu.topic, menu.difficulty
        );
    }
    if menu.levels.is_empty() {
        out.push_str("No crosswords yet.\n");
    }
    for entry in &menu.levels {
        let limit = if entry.time_limit_secs == 0 {
            "untimed".to_string()
        } else {
            secs_to_interval(entry.time_limit_secs)
        };
        let _ = writeln!(
            out,
            "{:>4}  {}  [{limit}]  {}",
            entry.id.value(),
            entry.title,
            status(entry)
        );
    }
    if let Some(easier) = menu.easier {
        let _ = writeln!(out, "easier: {easier}");
    }
    if let Some(harder) = menu.harder {
        let _ = writeln!(out, "harder: {harder}");
    }
    out
}

#[must_use]
pub fn tutorial(topic: Topic) -> String {
    let mut out = format!("{topic} tutorial\n\n");
    for (step, section) in tutorial::material(topic).iter().enumerate() {
        let _ = writeln!(out, "{}. {}", step + 1, section.title);
        if let Some(content) = section.content {
            let _ = writeln!(out, "   {content}");
        }
        if let Some(url) = section.video {
            let _ = writeln!(out, "   watch: {url}");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_marks_blocks_blanks_and_letters() {
        let cells = vec![
            (CellKey::new(0, 0), Some('S')),
            (CellKey::new(0, 1), None),
            (CellKey::new(1, 0), Some('M')),
        ];
        let out = grid(2, &cells);
        let rows: Vec<&str> = out.lines().collect();
        assert_eq!(rows[1], " 0  S .");
        assert_eq!(rows[2], " 1  M #");
    }

    #[test]
    fn clues_are_grouped_by_direction() {
        let mut definition = CluesInput::default();
        definition
            .across
            .insert(1, crossword_core::model::ClueEntry::new("Iteration", "SPRINT", 0, 0));
        definition
            .down
            .insert(1, crossword_core::model::ClueEntry::new("Framework", "SCRUM", 0, 0));
        let out = clues(&definition);
        assert_eq!(
            out,
            "Across:\n  1. Iteration (6 letters, starts at 0 0)\nDown:\n  1. Framework (5 letters, starts at 0 0)\n"
        );
    }

    #[test]
    fn tutorial_lists_numbered_steps() {
        let out = tutorial(Topic::Scrum);
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("SCRUM tutorial"));
        assert!(out.contains("1. Introduction to Scrum\n"));
        assert!(out.contains("   watch: https://www.youtube.com/embed/sLexw-z13Fo\n"));
    }
}
