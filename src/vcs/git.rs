use super::DiffSource;
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::process;
use git2::{Delta, DiffFindOptions, DiffFormat, DiffStatsFormat, Repository};
use std::path::{Path, PathBuf};
use std::process::Command;

/// git working tree; commits describe the staged changes only
pub struct GitRepo {
    repo: Repository,
}

/// a staged file as seen by the diff formatter
struct StagedFile {
    status: Delta,
    path: String,
    diff_ignored: bool, // lock files, minified files, binaries
}

impl GitRepo {
    /// find the repository containing `path` (can be anywhere within the repo)
    pub fn discover(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)?;
        if repo.is_bare() {
            return Err(git2::Error::from_str("bare repositories have no working tree").into());
        }
        Ok(Self { repo })
    }

    pub fn workdir(&self) -> &Path {
        // checked in discover()
        self.repo.workdir().unwrap_or_else(|| self.repo.path())
    }

    /// directory git looks in for hooks (`core.hooksPath` or `.git/hooks`)
    pub fn hooks_dir(&self) -> Result<PathBuf> {
        let config = self.repo.config()?;
        Ok(match config.get_path("core.hooksPath") {
            Ok(path) if path.is_absolute() => path,
            Ok(path) => self.workdir().join(path),
            Err(_) => self.repo.commondir().join("hooks"),
        })
    }

    /// staged files that were added, copied or modified (what linters should see)
    pub fn staged_for_hooks(&self) -> Result<Vec<String>> {
        let diff = self.staged_diff()?;
        Ok(staged_files(&diff)
            .into_iter()
            .filter(|f| matches!(f.status, Delta::Added | Delta::Copied | Delta::Modified))
            .map(|f| f.path)
            .collect())
    }

    /// diff HEAD (or the empty tree on an unborn branch) against the index
    fn staged_diff(&self) -> Result<git2::Diff<'_>> {
        let tree = match self.repo.head() {
            Ok(head) => Some(head.peel_to_tree()?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };

        // hooks may have restaged files since the index was last loaded
        let mut index = self.repo.index()?;
        index.read(false)?;

        let mut diff = self
            .repo
            .diff_tree_to_index(tree.as_ref(), Some(&index), None)?;

        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        find_opts.rename_threshold(50); // git default
        find_opts.copy_threshold(50);
        diff.find_similar(Some(&mut find_opts))?;

        Ok(diff)
    }
}

impl DiffSource for GitRepo {
    fn diff(&self, cancel: &CancelToken) -> Result<String> {
        cancel.check()?;
        let diff = self.staged_diff()?;
        let files = staged_files(&diff);
        format_diff(&diff, &files)
    }

    fn file_list(&self, cancel: &CancelToken) -> Result<String> {
        cancel.check()?;
        let diff = self.staged_diff()?;
        let paths: Vec<String> = staged_files(&diff).into_iter().map(|f| f.path).collect();
        Ok(paths.join("\n"))
    }

    fn stat(&self, cancel: &CancelToken) -> Result<String> {
        cancel.check()?;
        let diff = self.staged_diff()?;
        let buf = diff.stats()?.to_buf(DiffStatsFormat::FULL, 80)?;
        Ok(buf.as_str().unwrap_or_default().trim_end().to_string())
    }

    /// commit through the git binary so signing and config apply; hooks
    /// already ran before generation
    fn commit(&self, message: &str, cancel: &CancelToken) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(["commit", "--no-verify", "--message"])
            .arg(message)
            .current_dir(self.workdir());
        process::run_interactive(&mut cmd, cancel)
    }
}

fn staged_files(diff: &git2::Diff) -> Vec<StagedFile> {
    let mut files = Vec::new();

    for delta in diff.deltas() {
        let path = match delta.status() {
            Delta::Deleted => delta.old_file().path(),
            Delta::Modified
            | Delta::Typechange
            | Delta::Renamed
            | Delta::Added
            | Delta::Copied
            | Delta::Untracked => delta.new_file().path(),
            _ => continue, // ignored, unmodified, etc.
        };

        if let Some(path) = path {
            let path = path.to_string_lossy().to_string();
            let is_binary = delta.new_file().is_binary() || delta.old_file().is_binary();
            files.push(StagedFile {
                status: delta.status(),
                diff_ignored: is_binary || should_ignore_diff(&path),
                path,
            });
        }
    }

    files
}

/// lock files and minified assets only add noise to the prompt
fn should_ignore_diff(path: &str) -> bool {
    let path_lower = path.to_lowercase();

    if path_lower.ends_with("-lock.json") || path_lower.ends_with("-lock.yaml") {
        return true;
    }

    if Path::new(&path_lower)
        .extension()
        .is_some_and(|ext| ext == "lock")
    {
        return true;
    }

    [".min.js", ".min.css", "-min.js", "-min.css"]
        .iter()
        .any(|suffix| path_lower.ends_with(suffix))
}

/// render a unified diff, replacing ignored files with a one-line marker
fn format_diff(diff: &git2::Diff, files: &[StagedFile]) -> Result<String> {
    use std::fmt::Write;

    let mut output = String::new();
    let mut skip_current_file = false;

    diff.print(DiffFormat::Patch, |delta, _hunk, line| {
        let origin = line.origin();

        if origin == 'F' {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default();

            skip_current_file = files
                .iter()
                .find(|f| f.path == path)
                .is_some_and(|f| f.diff_ignored);

            if skip_current_file {
                let _ = writeln!(output, "--- {path} (diff ignored)");
                return true;
            }
        }

        if skip_current_file {
            return true;
        }

        if matches!(origin, '+' | '-' | ' ') {
            output.push(origin);
        }
        output.push_str(&String::from_utf8_lossy(line.content()));
        true
    })?;

    Ok(output.trim_end_matches('\n').to_string())
}
