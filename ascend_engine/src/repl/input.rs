//! Terminal input handling for the admin REPL.
//!
//! Wraps rustyline configuration and completion of command verbs and built-in
//! category ids, with a plain stdin fallback for pipes and scripts.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use log::{info, warn};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::command::COMMAND_VERBS;
use crate::defaults;

/// Outcome of reading a line from the REPL input.
pub enum InputEvent {
    Line(String),
    Eof,
    Interrupted,
}

lazy_static! {
    static ref COMMAND_TERMS: Vec<String> = build_command_terms();
}

type ReplEditor = rustyline::Editor<AscendHelper, DefaultHistory>;

#[derive(Default)]
struct AscendHelper;

impl Helper for AscendHelper {}

impl Completer for AscendHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let (start, word) = current_word(line, pos);
        if word.is_empty() {
            return Ok((start, Vec::new()));
        }
        let lower = word.to_lowercase();
        let pairs = COMMAND_TERMS
            .iter()
            .filter(|term| term.starts_with(&lower))
            .map(|term| Pair {
                display: term.clone(),
                replacement: term.clone(),
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for AscendHelper {
    type Hint = String;
}

impl Highlighter for AscendHelper {}

impl Validator for AscendHelper {}

/// The word under the cursor and where it starts.
fn current_word(line: &str, pos: usize) -> (usize, String) {
    let slice = &line[..pos];
    let start = slice.rfind(char::is_whitespace).map_or(0, |idx| idx + 1);
    (start, slice[start..].to_string())
}

fn build_command_terms() -> Vec<String> {
    let mut terms: Vec<String> = COMMAND_VERBS.iter().map(|verb| (*verb).to_string()).collect();
    terms.extend(defaults::categories().into_iter().map(|category| category.id));
    terms.sort_unstable();
    terms.dedup();
    terms
}

/// Admin console input: rustyline with history when stdin is a terminal,
/// plain line reads otherwise.
pub struct InputManager {
    editor: Option<ReplEditor>,
    history_path: Option<PathBuf>,
    buffer: String,
}

impl InputManager {
    pub fn new() -> Self {
        let history_path = history_file_path();
        let editor = if io::stdin().is_terminal() {
            match open_editor(history_path.as_deref()) {
                Ok(editor) => Some(editor),
                Err(err) => {
                    warn!("rustyline unavailable ({err}), reading plain stdin");
                    None
                },
            }
        } else {
            info!("stdin is not a terminal; reading plain lines");
            None
        };
        Self {
            editor,
            history_path,
            buffer: String::new(),
        }
    }

    /// Read one line. A failing editor is dropped and the read retried on plain stdin.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        let Some(editor) = self.editor.as_mut() else {
            return self.read_plain(prompt);
        };
        match editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    remember(editor, &line, self.history_path.as_deref());
                }
                Ok(InputEvent::Line(line))
            },
            Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
            Err(err) => {
                warn!("rustyline input failed: {err}; switching to plain stdin");
                self.editor = None;
                self.read_plain(prompt)
            },
        }
    }

    fn read_plain(&mut self, prompt: &str) -> io::Result<InputEvent> {
        print!("{prompt}");
        io::stdout().flush()?;
        self.buffer.clear();
        if io::stdin().read_line(&mut self.buffer)? == 0 {
            return Ok(InputEvent::Eof);
        }
        Ok(InputEvent::Line(self.buffer.trim_end_matches(['\n', '\r']).to_string()))
    }
}

fn open_editor(history_path: Option<&Path>) -> rustyline::Result<ReplEditor> {
    let mut editor = ReplEditor::new()?;
    editor.set_helper(Some(AscendHelper));
    if let Some(path) = history_path {
        match editor.load_history(path) {
            Ok(()) => {},
            Err(ReadlineError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {},
            Err(err) => warn!("could not load history from {}: {err}", path.display()),
        }
    }
    Ok(editor)
}

fn remember(editor: &mut ReplEditor, line: &str, history_path: Option<&Path>) {
    if let Err(err) = editor.add_history_entry(line) {
        warn!("could not record history: {err}");
    }
    let Some(path) = history_path else { return };
    if let Some(dir) = path.parent() {
        if let Err(err) = fs::create_dir_all(dir) {
            warn!("could not create {}: {err}", dir.display());
            return;
        }
    }
    if let Err(err) = editor.save_history(path) {
        warn!("could not save history to {}: {err}", path.display());
    }
}

fn history_file_path() -> Option<PathBuf> {
    dirs::data_dir()
        .or_else(dirs::data_local_dir)
        .map(|base| build_history_path(&base))
}

fn build_history_path(base: &Path) -> PathBuf {
    base.join("ascend_engine").join("history.txt")
}
