use crate::cancel::CancelToken;
use crate::constants::DEFAULT_EDITOR;
use crate::error::{Error, Result};
use crate::process;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, IsTerminal, Write};

#[macro_export]
macro_rules! warning {
    // format string literal (with or without inline formatting)
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!($fmt $(, $($arg)*)?).yellow());
    }};
    // arbitrary expression (non-literal)
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!("{}", $expr).yellow());
    }};
}

#[macro_export]
macro_rules! error {
    // format string literal (with or without inline formatting)
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!($fmt $(, $($arg)*)?).red());
    }};
    // arbitrary expression (non-literal)
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!("{}", $expr).red());
    }};
}

#[macro_export]
macro_rules! status {
    // format string literal (with or without inline formatting)
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", format!($fmt $(, $($arg)*)?).green());
    }};
    // arbitrary expression (non-literal)
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", format!("{}", $expr).green());
    }};
}

#[macro_export]
macro_rules! info {
    () => {{
        use std::io::{self, Write};
        let _ = writeln!(io::stdout());
    }};
    // format string literal (with or without inline formatting or args)
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), $fmt $(, $($arg)*)?);
    }};
    // arbitrary expression (non-literal)
    ($expr:expr) => {{
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", $expr);
    }};
}

/// source of user answers for the interactive loops
pub trait LineReader {
    /// show `prompt` and read one line, without its line terminator
    fn read_line(&mut self, prompt: &str) -> Result<String>;
}

/// line editing on an interactive terminal; ctrl-c cancels the run
pub struct Terminal {
    editor: DefaultEditor,
    cancel: CancelToken,
}

impl Terminal {
    pub fn new(cancel: CancelToken) -> Result<Self> {
        let editor = DefaultEditor::new().map_err(|e| Error::ReadInput(e.to_string()))?;
        Ok(Self { editor, cancel })
    }
}

impl LineReader for Terminal {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(line),
            // raw mode swallows SIGINT, so forward it to everyone else
            Err(ReadlineError::Interrupted) => {
                self.cancel.cancel();
                Err(Error::Cancelled)
            }
            Err(ReadlineError::Eof) => Err(Error::InputClosed),
            Err(e) => Err(Error::ReadInput(e.to_string())),
        }
    }
}

/// answers from a non-interactive stream (piped stdin, tests)
pub struct Piped<R>(pub R);

impl<R: BufRead> LineReader for Piped<R> {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        print!("{prompt}");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match self.0.read_line(&mut line) {
            Ok(0) => Err(Error::InputClosed),
            Ok(_) => Ok(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => Err(Error::ReadInput(e.to_string())),
        }
    }
}

/// terminal line editing when stdin is a tty, plain reads otherwise
pub fn line_reader(cancel: &CancelToken) -> Result<Box<dyn LineReader>> {
    if io::stdin().is_terminal() {
        Ok(Box::new(Terminal::new(cancel.clone())?))
    } else {
        Ok(Box::new(Piped(io::stdin().lock())))
    }
}

/// somewhere the user can rewrite the commit message
pub trait Editor {
    /// returns the edited text, trimmed
    fn edit(&self, text: &str, cancel: &CancelToken) -> Result<String>;
}

/// `$EDITOR` (or vi) on a temporary file
pub struct ExternalEditor {
    command: String,
}

impl ExternalEditor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn from_env() -> Self {
        let command = std::env::var("EDITOR")
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
        Self::new(command)
    }
}

impl Editor for ExternalEditor {
    fn edit(&self, text: &str, cancel: &CancelToken) -> Result<String> {
        use std::fs;
        use std::process::Command;
        use tempfile::Builder;

        // removed when dropped, whichever way this function returns
        let mut temp_file = Builder::new()
            .prefix("gcauto-")
            .suffix(".txt")
            .tempfile()?;
        temp_file.write_all(text.as_bytes())?;
        temp_file.flush()?;

        // run the editor via shell to properly handle arguments in EDITOR
        let quoted = shlex::try_quote(&temp_file.path().to_string_lossy())
            .map_err(io::Error::other)?
            .into_owned();
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(format!("{} {}", self.command, quoted));

        let status = process::status(&mut cmd, cancel)?;
        if !status.success() {
            return Err(Error::Editor {
                editor: self.command.clone(),
                status,
            });
        }

        Ok(fs::read_to_string(temp_file.path())?.trim().to_string())
    }
}
