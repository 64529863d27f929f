//! Admin read-eval-print loop around [`Progression`].

mod input;

use anyhow::{Context, Result};
use colored::Colorize;
use log::info;

use crate::api::Progression;
use crate::command::{execute, parse_command};

use input::{InputEvent, InputManager};

/// Run the REPL until `quit` or end of input, then flush every player.
///
/// # Errors
/// Returns an error when input can no longer be read from either backend.
pub fn run_repl(progression: &Progression) -> Result<()> {
    let mut input_manager = InputManager::new();
    let prompt = "ascend> ".bright_blue().to_string();

    loop {
        let line = match input_manager.read_line(&prompt) {
            Ok(InputEvent::Line(line)) => line,
            Ok(InputEvent::Eof) => "quit".to_string(),
            Ok(InputEvent::Interrupted) => {
                println!("{}", "Command canceled.".dimmed());
                continue;
            },
            Err(err) => {
                progression.shutdown();
                return Err(err).context("reading admin input");
            },
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = parse_command(&line);
        info!("admin command: {command:?}");
        let quit = command.is_quit();
        println!("{}", execute(progression, &command));
        if quit {
            break;
        }
    }

    progression.shutdown();
    Ok(())
}
