use crate::cancel::CancelToken;
use crate::changeset::FileEntry;
use crate::error::Result;
use crate::ui::LineReader;
use colored::Colorize;
use std::io::Write;

const PROMPT: &str = "select files to commit (toggle: numbers, a: all, n: none, enter: confirm): ";

/// which changed files take part in the commit; one flag per entry
pub struct Selection<'a> {
    entries: &'a [FileEntry],
    mask: Vec<bool>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ToggleError {
    Invalid(String),
    OutOfRange(usize),
}

impl<'a> Selection<'a> {
    /// everything starts selected
    pub fn new(entries: &'a [FileEntry]) -> Self {
        Self {
            entries,
            mask: vec![true; entries.len()],
        }
    }

    /// flip the entry at a 1-based index given as text
    pub fn toggle(&mut self, token: &str) -> std::result::Result<(), ToggleError> {
        let index: usize = token
            .parse()
            .map_err(|_| ToggleError::Invalid(token.to_string()))?;
        if index == 0 || index > self.mask.len() {
            return Err(ToggleError::OutOfRange(index));
        }
        self.mask[index - 1] = !self.mask[index - 1];
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.mask.fill(true);
    }

    pub fn select_none(&mut self) {
        self.mask.fill(false);
    }

    pub fn is_empty(&self) -> bool {
        !self.mask.contains(&true)
    }

    /// selected entries, in their original order
    pub fn selected(&self) -> Vec<FileEntry> {
        self.entries
            .iter()
            .zip(&self.mask)
            .filter(|(_, selected)| **selected)
            .map(|(entry, _)| entry.clone())
            .collect()
    }

    fn render(&self, out: &mut dyn Write) {
        let _ = writeln!(out, "\n{}", "changed files in working copy (@):".green());
        for (i, (entry, selected)) in self.entries.iter().zip(&self.mask).enumerate() {
            let checkbox = if *selected { "✅" } else { "❌" };
            let _ = writeln!(
                out,
                "  [{}] {} {} {}",
                i + 1,
                checkbox,
                entry.status,
                entry.path
            );
        }
    }
}

/// let the user narrow the set of files to commit
///
/// loops until a non-empty selection is confirmed with an empty line.
/// cancellation is checked before every prompt.
pub fn select_files(
    entries: &[FileEntry],
    input: &mut dyn LineReader,
    out: &mut dyn Write,
    cancel: &CancelToken,
) -> Result<Vec<FileEntry>> {
    let mut selection = Selection::new(entries);

    loop {
        cancel.check()?;
        selection.render(out);
        let _ = out.flush();

        let line = input.read_line(PROMPT)?;
        cancel.check()?;
        match line.trim() {
            "" => {
                if selection.is_empty() {
                    let _ = writeln!(
                        out,
                        "{}",
                        "no files selected, select at least one file".yellow()
                    );
                    continue;
                }
                return Ok(selection.selected());
            }
            "a" => selection.select_all(),
            "n" => selection.select_none(),
            tokens => {
                for token in tokens.split_whitespace() {
                    match selection.toggle(token) {
                        Ok(()) => {}
                        Err(ToggleError::Invalid(token)) => {
                            let _ = writeln!(out, "{}", format!("invalid input: {token}").yellow());
                        }
                        Err(ToggleError::OutOfRange(index)) => {
                            let _ = writeln!(
                                out,
                                "{}",
                                format!(
                                    "number out of range: {index} (valid: 1-{})",
                                    entries.len()
                                )
                                .yellow()
                            );
                        }
                    }
                }
            }
        }
    }
}
