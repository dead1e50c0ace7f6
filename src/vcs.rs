mod git;
mod hooks;
mod jj;
mod partial;

pub use git::GitRepo;
pub use hooks::run_pre_commit;
pub use jj::JjWorkspace;

use crate::cancel::CancelToken;
use crate::changeset::ChangeSet;
use crate::error::{Error, Result};
use crate::process;
use std::fmt;
use std::path::Path;
use std::process::Command;

/// the version control system driving this run, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Git,
    Jujutsu,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Git => write!(f, "git"),
            Self::Jujutsu => write!(f, "jujutsu"),
        }
    }
}

/// change inspection and commit operations common to both backends
pub trait DiffSource {
    fn diff(&self, cancel: &CancelToken) -> Result<String>;
    fn file_list(&self, cancel: &CancelToken) -> Result<String>;
    fn stat(&self, cancel: &CancelToken) -> Result<String>;
    fn commit(&self, message: &str, cancel: &CancelToken) -> Result<()>;
}

pub enum Backend {
    Git(GitRepo),
    Jujutsu(JjWorkspace),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Git(_) => BackendKind::Git,
            Self::Jujutsu(_) => BackendKind::Jujutsu,
        }
    }

    fn source(&self) -> &dyn DiffSource {
        match self {
            Self::Git(repo) => repo,
            Self::Jujutsu(workspace) => workspace,
        }
    }
}

impl DiffSource for Backend {
    fn diff(&self, cancel: &CancelToken) -> Result<String> {
        self.source().diff(cancel)
    }

    fn file_list(&self, cancel: &CancelToken) -> Result<String> {
        self.source().file_list(cancel)
    }

    fn stat(&self, cancel: &CancelToken) -> Result<String> {
        self.source().stat(cancel)
    }

    fn commit(&self, message: &str, cancel: &CancelToken) -> Result<()> {
        self.source().commit(message, cancel)
    }
}

/// pick jujutsu when `jj root` succeeds, git otherwise
pub fn detect(cancel: &CancelToken) -> BackendKind {
    detect_in(Path::new("."), cancel)
}

fn detect_in(dir: &Path, cancel: &CancelToken) -> BackendKind {
    let mut cmd = Command::new("jj");
    cmd.arg("root").current_dir(dir);
    match process::run(&mut cmd, None, cancel) {
        Ok(_) => BackendKind::Jujutsu,
        Err(_) => BackendKind::Git,
    }
}

/// read the pending changes, or `None` when there is nothing to commit
///
/// only the diff is required; a failing file list or stat is reported and
/// replaced with an empty string
pub fn gather(source: &dyn DiffSource, cancel: &CancelToken) -> Result<Option<ChangeSet>> {
    let diff = source.diff(cancel)?;
    if diff.trim().is_empty() {
        return Ok(None);
    }

    let files = non_fatal(source.file_list(cancel), "file list")?;
    let stat = non_fatal(source.stat(cancel), "diff stat")?;

    Ok(Some(ChangeSet { diff, files, stat }))
}

fn non_fatal(result: Result<String>, what: &str) -> Result<String> {
    match result {
        Ok(text) => Ok(text),
        Err(Error::Cancelled) => Err(Error::Cancelled),
        Err(e) => {
            crate::warning!("failed to get {}: {}", what, e);
            Ok(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeSource {
        diff: &'static str,
        files: Option<&'static str>,
        stat_cancelled: bool,
        commits: RefCell<Vec<String>>,
    }

    impl FakeSource {
        fn new(diff: &'static str) -> Self {
            Self {
                diff,
                files: Some("a.rs\nb.rs"),
                stat_cancelled: false,
                commits: RefCell::new(Vec::new()),
            }
        }
    }

    impl DiffSource for FakeSource {
        fn diff(&self, _cancel: &CancelToken) -> Result<String> {
            Ok(self.diff.to_string())
        }

        fn file_list(&self, _cancel: &CancelToken) -> Result<String> {
            self.files
                .map(str::to_string)
                .ok_or_else(|| Error::ReadInput("boom".to_string()))
        }

        fn stat(&self, _cancel: &CancelToken) -> Result<String> {
            if self.stat_cancelled {
                Err(Error::Cancelled)
            } else {
                Ok(" 2 files changed".to_string())
            }
        }

        fn commit(&self, message: &str, _cancel: &CancelToken) -> Result<()> {
            self.commits.borrow_mut().push(message.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_gather_collects_everything() {
        let source = FakeSource::new("diff --git a/a.rs b/a.rs");
        let changes = gather(&source, &CancelToken::new()).unwrap().unwrap();
        assert_eq!(changes.diff, "diff --git a/a.rs b/a.rs");
        assert_eq!(changes.files, "a.rs\nb.rs");
        assert_eq!(changes.stat, " 2 files changed");
        assert!(source.commits.borrow().is_empty());
    }

    #[test]
    fn test_gather_empty_diff_is_nothing_to_do() {
        let source = FakeSource::new("  \n");
        assert!(gather(&source, &CancelToken::new()).unwrap().is_none());
    }

    #[test]
    fn test_gather_file_list_failure_is_non_fatal() {
        let mut source = FakeSource::new("diff");
        source.files = None;
        let changes = gather(&source, &CancelToken::new()).unwrap().unwrap();
        assert_eq!(changes.files, "");
    }

    #[test]
    fn test_gather_propagates_cancellation() {
        let mut source = FakeSource::new("diff");
        source.stat_cancelled = true;
        let err = gather(&source, &CancelToken::new()).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_detect_outside_jj_is_git() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(detect_in(dir.path(), &CancelToken::new()), BackendKind::Git);
    }

    #[test]
    fn test_detect_when_cancelled_is_git() {
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(detect_in(Path::new("."), &cancel), BackendKind::Git);
    }
}
