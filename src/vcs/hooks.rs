use super::GitRepo;
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::process;
use crate::{status, warning};
use std::path::Path;
use std::process::Command;

const PRE_COMMIT_CONFIG: &str = ".pre-commit-config.yaml";

/// run pre-commit checks before a message is generated
///
/// prefers the `pre-commit` framework when the repository is configured for
/// it, otherwise runs the plain git hook if one is installed. commits later
/// skip hooks (`--no-verify`), so this is the only place they run.
pub fn run_pre_commit(repo: &GitRepo, cancel: &CancelToken) -> Result<()> {
    let root = repo.workdir();

    if root.join(PRE_COMMIT_CONFIG).is_file() {
        return run_framework(repo, root, cancel);
    }

    let hook = repo.hooks_dir()?.join("pre-commit");
    if !is_executable(&hook) {
        return Ok(());
    }

    status!("running pre-commit hook...");
    let mut cmd = Command::new(&hook);
    cmd.current_dir(root);
    process::run_interactive(&mut cmd, cancel).map_err(hook_error)?;
    status!("pre-commit hook passed");
    Ok(())
}

fn run_framework(repo: &GitRepo, root: &Path, cancel: &CancelToken) -> Result<()> {
    if which::which("pre-commit").is_err() {
        warning!("{} found but pre-commit is not installed", PRE_COMMIT_CONFIG);
        warning!("skipping pre-commit hooks; install with: pip install pre-commit");
        return Ok(());
    }

    let files = repo.staged_for_hooks()?;
    if files.is_empty() {
        status!("no staged files to check");
        return Ok(());
    }

    status!("running pre-commit hooks...");
    let mut cmd = Command::new("pre-commit");
    cmd.args(["run", "--files"]).args(&files).current_dir(root);
    process::run_interactive(&mut cmd, cancel).map_err(hook_error)?;
    status!("pre-commit hooks passed");
    Ok(())
}

fn hook_error(e: Error) -> Error {
    match e {
        Error::CommandFailed { status, .. } => Error::Hook(status.to_string()),
        other => other,
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
