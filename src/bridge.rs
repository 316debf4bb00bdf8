//! Line-oriented host bridge.
//!
//! The host drives a [`Session`] over stdin/stdout with one command per
//! line. Responses follow the GTP convention: `=` on success, `?` on
//! failure, an optional numeric id echoed back, and a blank line after
//! every response.
//!
//! ## Supported Commands
//!
//! - `name` - Return engine name
//! - `version` - Return engine version
//! - `list_commands` - List all supported commands
//! - `known_command <cmd>` - Check if a command is supported
//! - `quit` - Exit the program
//! - `catalog <json>` - Replace the ability catalog (drops the board)
//! - `board <json>` - Load a 64-square board and enter setup
//! - `select <square>` - Report what clicking a square means
//! - `deploy <square> <json>` - Deploy a player piece during setup
//! - `begin` - Start combat
//! - `actions` - List legal actions as JSON
//! - `play <json>` - Apply an action for the side to move
//! - `pass` - End the current turn without acting
//! - `genmove` - Let the AI search and play its turn
//! - `status` - One-line session summary
//! - `show` - Print the board
//!
//! ## Example
//!
//! ```ignore
//! use chess_crawler::bridge::Bridge;
//! let mut bridge = Bridge::new();
//! bridge.run()?;
//! ```

use std::io::{self, BufRead, Write};

use crate::action::Action;
use crate::config::SearchConfig;
use crate::ingest::parse_square;
use crate::session::Session;

/// The list of known bridge commands.
const KNOWN_COMMANDS: &[&str] = &[
    "actions",
    "begin",
    "board",
    "catalog",
    "deploy",
    "genmove",
    "known_command",
    "list_commands",
    "name",
    "pass",
    "play",
    "quit",
    "select",
    "show",
    "status",
    "version",
];

/// Bridge engine state.
pub struct Bridge {
    session: Session,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(config: SearchConfig) -> Self {
        let mut session = Session::default();
        session.set_config(config);
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run the command loop on stdin/stdout until `quit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Run the command loop over arbitrary streams.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let (command, rest) = match command_line.split_once(char::is_whitespace) {
                Some((command, rest)) => (command, rest.trim()),
                None => (command_line, ""),
            };
            let command = command.to_lowercase();

            let (success, message) = self.execute(&command, rest);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Execute one command and return (success, response).
    ///
    /// `rest` is everything after the command word, so JSON arguments may
    /// contain spaces.
    pub fn execute(&mut self, command: &str, rest: &str) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                if rest.is_empty() {
                    return (false, "missing argument".to_string());
                }
                let known = KNOWN_COMMANDS.contains(&rest.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "catalog" => match crate::ability::AbilityCatalog::from_json(rest) {
                Ok(catalog) => {
                    let n = catalog.len();
                    self.session.set_catalog(catalog);
                    (true, format!("{n} abilities"))
                }
                Err(e) => (false, e.to_string()),
            },

            "board" => match self.session.load_board(rest) {
                Ok(()) => (true, self.session.status()),
                Err(e) => (false, e.to_string()),
            },

            "select" => match rest.parse::<usize>() {
                Ok(sq) => (true, self.session.select_square(sq).to_string()),
                Err(_) => (false, "invalid square".to_string()),
            },

            "deploy" => {
                let Some((sq, descriptor)) = rest.split_once(char::is_whitespace) else {
                    return (false, "missing arguments".to_string());
                };
                let Ok(sq) = sq.parse::<usize>() else {
                    return (false, "invalid square".to_string());
                };
                let value = match serde_json::from_str(descriptor) {
                    Ok(value) => value,
                    Err(e) => return (false, format!("invalid piece JSON: {e}")),
                };
                let piece = match parse_square(sq, &value, self.session.catalog()) {
                    Ok(piece) => piece,
                    Err(e) => return (false, e.to_string()),
                };
                match self.session.deploy(sq, piece) {
                    Ok(()) => (true, String::new()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "begin" => match self.session.begin_combat() {
                Ok(()) => (true, self.session.status()),
                Err(e) => (false, e.to_string()),
            },

            "actions" => match self.session.legal_actions() {
                Ok(actions) => to_json(&actions),
                Err(e) => (false, e.to_string()),
            },

            "play" => {
                let action: Action = match serde_json::from_str(rest) {
                    Ok(action) => action,
                    Err(e) => return (false, format!("invalid action JSON: {e}")),
                };
                match self.session.apply_action(action) {
                    Ok(_) => (true, self.session.status()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "pass" => match self.session.pass_turn() {
                Ok(()) => (true, self.session.status()),
                Err(e) => (false, e.to_string()),
            },

            "genmove" => match self.session.ai_turn() {
                Ok(Some(action)) => to_json(&action),
                Ok(None) => (true, "pass".to_string()),
                Err(e) => (false, e.to_string()),
            },

            "status" => (true, self.session.status()),

            "show" => match self.session.state() {
                Some(state) => (true, format!("\n{}", state.board())),
                None => (false, "no board loaded".to_string()),
            },

            _ => (false, format!("unknown command: {command}")),
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> (bool, String) {
    match serde_json::to_string(value) {
        Ok(json) => (true, json),
        Err(e) => (false, e.to_string()),
    }
}
