use std::env;

use log::{debug, warn};
use rustyline::{error::ReadlineError, Editor};

use lisp2json::{has_open_string, json_to_text, text_to_json_pretty, Error as ConvertError};

const HISTORY_VAR: &str = "LISP2JSON_HISTORY";
const DEFAULT_HISTORY: &str = "history.txt";

const HELP: &str = "\
:lisp  read Lisp forms, print JSON (default)
:json  read a JSON document, print Lisp forms
:help  show this message";

#[derive(Clone, Copy, Debug, PartialEq)]
enum Mode {
    Lisp,
    Json,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Lisp
    }
}

impl Mode {
    fn prompt_name(self) -> &'static str {
        match self {
            Mode::Lisp => "lisp",
            Mode::Json => "json",
        }
    }

    fn convert(self, source: &str) -> Result<String, ConvertError> {
        match self {
            Mode::Lisp => text_to_json_pretty(source),
            Mode::Json => json_to_text(source),
        }
    }
}

#[derive(Debug)]
enum ReplError {
    Incomplete,
    Convert(ConvertError),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Command {
    Switch(Mode),
    Help,
    Unknown,
}

fn command(line: &str) -> Option<Command> {
    match line.trim() {
        ":lisp" => Some(Command::Switch(Mode::Lisp)),
        ":json" => Some(Command::Switch(Mode::Json)),
        ":help" => Some(Command::Help),
        other if other.starts_with(':') => Some(Command::Unknown),
        _ => None,
    }
}

#[derive(Clone, Debug, Default)]
struct ReplState {
    line_number: usize,
    lines: Vec<String>,
    mode: Mode,
}

impl ReplState {
    fn prompt(&mut self) -> String {
        if self.lines.is_empty() {
            self.line_number += 1;
            format!("{}({})> ", self.mode.prompt_name(), self.line_number)
        } else {
            format!("....({})> ", self.line_number)
        }
    }
}

fn read(state: &mut ReplState, text: String) -> Result<String, ReplError> {
    state.lines.push(text);

    let current_lines = state.lines.join("\n");

    if state.mode == Mode::Lisp && has_open_string(&current_lines) {
        debug!("string still open in {:?}", current_lines);

        return Err(ReplError::Incomplete);
    }

    debug!("converting {:?} in {:?} mode", current_lines, state.mode);

    state
        .mode
        .convert(&current_lines)
        .map(|output| {
            state.lines.clear();

            output
        })
        .map_err(|err| {
            if err.is_incomplete() {
                ReplError::Incomplete
            } else {
                state.lines.clear();

                ReplError::Convert(err)
            }
        })
}

fn main() {
    env_logger::init();

    let mut rl = Editor::<()>::new();
    let version = env!("CARGO_PKG_VERSION");
    let history = env::var(HISTORY_VAR).unwrap_or_else(|_| DEFAULT_HISTORY.to_string());

    println!("lisp2json v{} (:help for commands)", version);

    if rl.load_history(&history).is_err() {
        println!("No previous history.");
    }

    let mut state = ReplState::default();

    loop {
        let prefix = state.prompt();

        match rl.readline(&prefix) {
            Ok(line) => {
                if !line.is_empty() {
                    rl.add_history_entry(line.as_str());
                }

                if state.lines.is_empty() {
                    match command(&line) {
                        Some(Command::Switch(mode)) => {
                            state.mode = mode;
                            continue;
                        }
                        Some(Command::Help) => {
                            println!("{}", HELP);
                            continue;
                        }
                        Some(Command::Unknown) => {
                            println!("Unknown command, try :help");
                            continue;
                        }
                        None if line.trim().is_empty() => continue,
                        None => (),
                    }
                }

                let next_line = line.trim_end().to_string();

                match read(&mut state, next_line) {
                    Ok(output) => println!("{}", output),
                    Err(ReplError::Incomplete) => (),
                    Err(ReplError::Convert(err)) => println!("Error: {}", err),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Err(err) = rl.save_history(&history) {
        warn!("could not save history to {}: {}", history, err);
    }
}
