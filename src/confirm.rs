use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::ui::{Editor, LineReader};
use colored::Colorize;
use std::io::Write;

const PROMPT: &str = "commit with this message? (y)es / (n)o / (e)dit: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Presenting,
    Committing,
    Editing,
    Canceled,
    Done,
}

/// an answer at the confirmation prompt
#[derive(Debug, PartialEq, Eq)]
pub enum Choice {
    Yes,
    No,
    Edit,
    Invalid(String),
}

impl Choice {
    pub fn parse(input: &str) -> Self {
        let answer = input.trim().to_lowercase();
        match answer.as_str() {
            "y" | "yes" => Self::Yes,
            "n" | "no" | "" => Self::No,
            "e" | "edit" => Self::Edit,
            _ => Self::Invalid(answer),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    Canceled,
}

fn present(out: &mut dyn Write, message: &str) {
    let _ = writeln!(out, "\n{}", "generated commit message:".green());
    let _ = writeln!(out, "{}", "─".repeat(60).dimmed());
    let _ = writeln!(out, "{message}");
    let _ = writeln!(out, "{}", "─".repeat(60).dimmed());
    let _ = out.flush();
}

fn commit_checked(message: &str, commit: &mut dyn FnMut(&str) -> Result<()>) -> Result<()> {
    if message.trim().is_empty() {
        return Err(Error::EmptyMessage);
    }
    commit(message)
}

/// show the message and loop until the user commits or gives up
///
/// editing returns to the prompt with the new message; a failed or empty
/// edit keeps the previous one. a failed commit ends the loop with its
/// error.
pub fn run(
    message: String,
    input: &mut dyn LineReader,
    out: &mut dyn Write,
    editor: &dyn Editor,
    mut commit: impl FnMut(&str) -> Result<()>,
    cancel: &CancelToken,
) -> Result<Outcome> {
    let mut message = message;
    let mut state = State::Presenting;

    loop {
        state = match state {
            State::Presenting => {
                cancel.check()?;
                present(out, &message);
                let answer = input.read_line(PROMPT)?;
                // a plain read can't see ctrl-c, only the token can
                cancel.check()?;
                match Choice::parse(&answer) {
                    Choice::Yes => State::Committing,
                    Choice::No => State::Canceled,
                    Choice::Edit => State::Editing,
                    Choice::Invalid(answer) => {
                        let _ = writeln!(
                            out,
                            "{}",
                            format!("invalid choice '{answer}', enter y, n or e").yellow()
                        );
                        State::Presenting
                    }
                }
            }
            State::Editing => {
                match editor.edit(&message, cancel) {
                    Ok(edited) if edited.is_empty() => {
                        let _ = writeln!(
                            out,
                            "{}",
                            "edited message is empty, keeping the previous one".yellow()
                        );
                    }
                    Ok(edited) => message = edited,
                    Err(e) if e.is_cancelled() => return Err(e),
                    Err(e) => {
                        let _ = writeln!(
                            out,
                            "{}",
                            format!("edit failed: {e}, keeping the previous message").yellow()
                        );
                    }
                }
                State::Presenting
            }
            State::Committing => {
                commit_checked(&message, &mut commit)?;
                State::Done
            }
            State::Canceled => {
                let _ = writeln!(out, "{}", "commit canceled".yellow());
                return Ok(Outcome::Canceled);
            }
            State::Done => return Ok(Outcome::Committed),
        };
    }
}

/// display the message once and commit without asking
pub fn auto(
    message: &str,
    out: &mut dyn Write,
    mut commit: impl FnMut(&str) -> Result<()>,
) -> Result<Outcome> {
    present(out, message);
    commit_checked(message, &mut commit)?;
    Ok(Outcome::Committed)
}
