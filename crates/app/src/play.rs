use anyhow::{Result, bail};
use crossword_core::model::CellKey;
use services::{HintOutcome, SessionError, SessionHandle};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render;

const HELP: &str = "\
commands:
  set <row> <col> <letter>   write a letter
  clear <row> <col>          erase a cell
  hint                       reveal one cell (costs a heart)
  restart                    throw this attempt away
  show                       print the board again
  quit                       save and leave";

/// One line typed at the play prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayCommand {
    Set { cell: CellKey, letter: char },
    Clear { cell: CellKey },
    Hint,
    Restart,
    Show,
    Help,
    Quit,
}

fn parse_cell(row: Option<&str>, col: Option<&str>) -> Result<CellKey> {
    let (Some(row), Some(col)) = (row, col) else {
        bail!("expected a row and a column");
    };
    let (Ok(row), Ok(col)) = (row.parse(), col.parse()) else {
        bail!("row and column must be numbers");
    };
    Ok(CellKey::new(row, col))
}

/// # Errors
///
/// Returns a message for unknown commands or malformed arguments.
pub fn parse_command(line: &str) -> Result<Option<PlayCommand>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "set" | "s" => {
            let cell = parse_cell(words.next(), words.next())?;
            let mut letter = words.next().unwrap_or_default().chars();
            let (Some(letter), None) = (letter.next(), letter.next()) else {
                bail!("expected a single letter");
            };
            PlayCommand::Set { cell, letter }
        }
        "clear" | "c" => PlayCommand::Clear {
            cell: parse_cell(words.next(), words.next())?,
        },
        "hint" | "h" => PlayCommand::Hint,
        "restart" => PlayCommand::Restart,
        "show" => PlayCommand::Show,
        "help" | "?" => PlayCommand::Help,
        "quit" | "q" | "exit" => PlayCommand::Quit,
        other => bail!("unknown command {other:?}, type `help`"),
    };
    if words.next().is_some() {
        bail!("too many arguments");
    }
    Ok(Some(command))
}

async fn execute(handle: &SessionHandle, command: PlayCommand) {
    match command {
        PlayCommand::Set { cell, letter } => match handle.guess(cell, letter).await {
            Ok(_) => println!("{}", render::session(&handle.view())),
            Err(e) => println!("cannot set {cell}: {e}"),
        },
        PlayCommand::Clear { cell } => match handle.clear(cell).await {
            Ok(_) => println!("{}", render::session(&handle.view())),
            Err(e) => println!("cannot clear {cell}: {e}"),
        },
        PlayCommand::Hint => match handle.reveal_hint().await {
            Ok(HintOutcome::Revealed {
                cell,
                letter,
                recorded,
                ..
            }) => {
                println!("revealed {letter} at {cell}");
                if !recorded {
                    println!("(the hint could not be saved and was not counted)");
                }
                println!("{}", render::session(&handle.view()));
            }
            Ok(HintOutcome::NothingToReveal) => println!("every cell is already correct"),
            Err(SessionError::NoHintsLeft) => println!("no hints left"),
            Err(e) => println!("cannot reveal a hint: {e}"),
        },
        PlayCommand::Restart => match handle.restart().await {
            Ok(()) => println!("{}", render::session(&handle.view())),
            Err(e) => println!("restart failed: {e}"),
        },
        PlayCommand::Show => println!("{}", render::session(&handle.view())),
        PlayCommand::Help => println!("{HELP}"),
        PlayCommand::Quit => {}
    }
}

/// Read commands from stdin until `quit` or end of input, then shut the
/// session down.
pub async fn run(handle: SessionHandle) -> Result<()> {
    let mut updates = handle.subscribe();
    let mut announced = updates.borrow_and_update().dialog();
    println!("{}", render::session(&handle.view()));
    if let Some(dialog) = announced {
        println!("{}", render::dialog(dialog));
    }
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let result = loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e.into()),
                };
                match parse_command(&line) {
                    Ok(Some(PlayCommand::Quit)) => break Ok(()),
                    Ok(Some(command)) => execute(&handle, command).await,
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let dialog = updates.borrow_and_update().dialog();
                if dialog != announced {
                    if let Some(dialog) = dialog {
                        println!("{}", render::dialog(dialog));
                    }
                    announced = dialog;
                }
            }
        }
    };

    handle.shutdown().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_play_commands() {
        assert_eq!(
            parse_command("set 0 3 i").unwrap(),
            Some(PlayCommand::Set {
                cell: CellKey::new(0, 3),
                letter: 'i'
            })
        );
        assert_eq!(
            parse_command("  CLEAR 2 0 ").unwrap(),
            Some(PlayCommand::Clear {
                cell: CellKey::new(2, 0)
            })
        );
        assert_eq!(parse_command("hint").unwrap(), Some(PlayCommand::Hint));
        assert_eq!(parse_command("q").unwrap(), Some(PlayCommand::Quit));
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(parse_command("set 0 x A").is_err());
        assert!(parse_command("set 0 0 AB").is_err());
        assert!(parse_command("set 0 0").is_err());
        assert!(parse_command("hint now").is_err());
        assert!(parse_command("dance").is_err());
    }
}
