use super::DiffSource;
use super::partial::{self, WorkingCopy};
use crate::cancel::CancelToken;
use crate::changeset::{FileEntry, FileStatus};
use crate::error::Result;
use crate::process;
use crate::warning;
use std::path::{Path, PathBuf};
use std::process::Command;

/// jujutsu working copy (`@`), optionally narrowed to a subset of files
pub struct JjWorkspace {
    workdir: PathBuf,
    scope: Scope,
}

enum Scope {
    All,
    Selected {
        selected: Vec<FileEntry>,
        all: Vec<FileEntry>,
    },
}

impl JjWorkspace {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            scope: Scope::All,
        }
    }

    pub fn current() -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    /// every changed file in `@`, as reported by `jj diff --summary`
    pub fn summary(&self, cancel: &CancelToken) -> Result<Vec<FileEntry>> {
        let output = process::run(self.jj().args(["diff", "--summary"]), None, cancel)?;
        Ok(parse_summary(&output))
    }

    /// restrict diff, stat and commit to `selected`
    ///
    /// selecting every file keeps the ordinary whole-commit path
    pub fn narrow(&mut self, selected: Vec<FileEntry>, all: Vec<FileEntry>) {
        self.scope = if selected.len() == all.len() {
            Scope::All
        } else {
            Scope::Selected { selected, all }
        };
    }

    pub fn selected_count(&self) -> Option<usize> {
        match &self.scope {
            Scope::All => None,
            Scope::Selected { selected, .. } => Some(selected.len()),
        }
    }

    pub fn diff_for_paths(&self, paths: &[String], cancel: &CancelToken) -> Result<String> {
        process::run(
            self.jj().arg("diff").args(paths.iter().map(|p| fileset(p))),
            None,
            cancel,
        )
    }

    pub fn stat_for_paths(&self, paths: &[String], cancel: &CancelToken) -> Result<String> {
        let output = process::run(
            self.jj()
                .args(["diff", "--stat"])
                .args(paths.iter().map(|p| fileset(p))),
            None,
            cancel,
        )?;
        Ok(output.trim().to_string())
    }

    fn selected_paths(&self) -> Option<Vec<String>> {
        match &self.scope {
            Scope::All => None,
            Scope::Selected { selected, .. } => {
                Some(selected.iter().map(|e| e.path.clone()).collect())
            }
        }
    }

    fn jj(&self) -> Command {
        let mut cmd = Command::new("jj");
        cmd.current_dir(&self.workdir);
        cmd
    }
}

impl DiffSource for JjWorkspace {
    fn diff(&self, cancel: &CancelToken) -> Result<String> {
        match self.selected_paths() {
            Some(paths) => self.diff_for_paths(&paths, cancel),
            None => process::run(self.jj().arg("diff"), None, cancel),
        }
    }

    fn file_list(&self, cancel: &CancelToken) -> Result<String> {
        let paths = match self.selected_paths() {
            Some(paths) => paths,
            None => self
                .summary(cancel)?
                .into_iter()
                .map(|e| e.path)
                .collect(),
        };
        Ok(paths.join("\n"))
    }

    fn stat(&self, cancel: &CancelToken) -> Result<String> {
        match self.selected_paths() {
            Some(paths) => self.stat_for_paths(&paths, cancel),
            None => {
                let output = process::run(self.jj().args(["diff", "--stat"]), None, cancel)?;
                Ok(output.trim().to_string())
            }
        }
    }

    fn commit(&self, message: &str, cancel: &CancelToken) -> Result<()> {
        match &self.scope {
            Scope::All => self.commit_all(message, cancel),
            Scope::Selected { selected, all } => {
                let paths: Vec<String> = selected.iter().map(|e| e.path.clone()).collect();
                partial::partial_commit(self, message, &paths, all, cancel)
            }
        }
    }
}

impl WorkingCopy for JjWorkspace {
    fn root(&self) -> &Path {
        &self.workdir
    }

    fn restore(&self, paths: &[String], cancel: &CancelToken) -> Result<()> {
        process::run_interactive(
            self.jj()
                .arg("restore")
                .args(paths.iter().map(|p| fileset(p))),
            cancel,
        )
    }

    fn commit_all(&self, message: &str, cancel: &CancelToken) -> Result<()> {
        process::run_interactive(self.jj().args(["commit", "--message", message]), cancel)
    }
}

/// parse `jj diff --summary` output (`M path`, `A path`, `D path`)
///
/// renames (`R dir/{old => new}`) become a deletion plus an addition and
/// copies (`C`) an addition, so every entry names a single real path
pub fn parse_summary(summary: &str) -> Vec<FileEntry> {
    let mut entries = Vec::new();

    for line in summary.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((code, path)) = line.split_once(' ') else {
            continue;
        };
        let path = path.trim();

        match code {
            "R" | "C" => match split_rename(path) {
                Some((old, new)) => {
                    if code == "R" {
                        entries.push(FileEntry::new(FileStatus::Deleted, old));
                    }
                    entries.push(FileEntry::new(FileStatus::Added, new));
                }
                None => warning!("skipping unrecognised jj summary line: {}", line),
            },
            _ => {
                let status = code
                    .chars()
                    .next()
                    .filter(|_| code.len() == 1)
                    .and_then(FileStatus::from_code);
                match status {
                    Some(status) => entries.push(FileEntry::new(status, path)),
                    None => warning!("skipping unrecognised jj summary line: {}", line),
                }
            }
        }
    }

    entries
}

/// `src/{old.rs => new.rs}` → (`src/old.rs`, `src/new.rs`)
fn split_rename(text: &str) -> Option<(String, String)> {
    let open = text.find('{')?;
    let close = open + text[open..].find('}')?;
    let (old, new) = text[open + 1..close].split_once(" => ")?;
    let (prefix, suffix) = (&text[..open], &text[close + 1..]);

    let join = |middle: &str| {
        format!("{prefix}{middle}{suffix}")
            .replace("//", "/")
            .trim_start_matches('/')
            .to_string()
    };
    Some((join(old), join(new)))
}

/// quote a path as a literal jj fileset so glob and operator characters are
/// not interpreted
fn fileset(path: &str) -> String {
    let escaped = path.replace('\\', "\\\\").replace('"', "\\\"");
    format!("file:\"{escaped}\"")
}
