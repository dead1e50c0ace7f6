use crate::cancel::CancelToken;
use crate::changeset::{FileEntry, FileStatus};
use crate::error::{Error, Result};
use crate::{error, info, warning};
use std::collections::HashSet;
use std::fs::{self, Permissions};
use std::io;
use std::path::Path;

/// the operations a partial commit needs from the backend
pub trait WorkingCopy {
    /// directory the entry paths are relative to
    fn root(&self) -> &Path;

    /// revert `paths` to their last recorded state, in one call
    fn restore(&self, paths: &[String], cancel: &CancelToken) -> Result<()>;

    /// commit every change currently in the working copy
    fn commit_all(&self, message: &str, cancel: &CancelToken) -> Result<()>;
}

/// what an excluded file looked like before it was set aside
enum Disposition {
    Deleted,
    Content {
        bytes: Vec<u8>,
        permissions: Permissions,
    },
}

struct SavedFile {
    path: String,
    disposition: Disposition,
}

impl SavedFile {
    fn capture(root: &Path, entry: &FileEntry) -> Result<Self> {
        let disposition = if entry.status == FileStatus::Deleted {
            Disposition::Deleted
        } else {
            let full = root.join(&entry.path);
            let capture_err = |source| Error::Capture {
                path: entry.path.clone(),
                source,
            };
            let bytes = fs::read(&full).map_err(capture_err)?;
            let permissions = fs::metadata(&full).map_err(capture_err)?.permissions();
            Disposition::Content { bytes, permissions }
        };

        Ok(Self {
            path: entry.path.clone(),
            disposition,
        })
    }

    /// put the file back the way it was captured
    fn reapply(&self, root: &Path) -> io::Result<()> {
        let full = root.join(&self.path);
        match &self.disposition {
            Disposition::Deleted => match fs::remove_file(&full) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
            Disposition::Content { bytes, permissions } => {
                // restoring an added file may have removed its directory
                if let Some(parent) = full.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&full, bytes)?;
                fs::set_permissions(&full, permissions.clone())
            }
        }
    }
}

/// commit only `selected`, leaving every other changed file as it was
///
/// excluded files are captured, reverted with a single restore, and written
/// back once the commit lands. if the restore or commit fails they are put
/// back on a best-effort basis before the original error is returned.
///
/// cancellation during the final write-back stops immediately and lists the
/// files still needing manual restoration. a file that cannot be written back
/// does not stop the others; every such file is named in `Error::Recovery`.
pub fn partial_commit<W: WorkingCopy + ?Sized>(
    working_copy: &W,
    message: &str,
    selected: &[String],
    all: &[FileEntry],
    cancel: &CancelToken,
) -> Result<()> {
    let selected: HashSet<&str> = selected.iter().map(String::as_str).collect();
    let excluded: Vec<&FileEntry> = all
        .iter()
        .filter(|entry| !selected.contains(entry.path.as_str()))
        .collect();

    if excluded.is_empty() {
        return working_copy.commit_all(message, cancel);
    }

    let root = working_copy.root();
    let saved = excluded
        .iter()
        .map(|entry| SavedFile::capture(root, entry))
        .collect::<Result<Vec<_>>>()?;
    let excluded_paths: Vec<String> = saved.iter().map(|f| f.path.clone()).collect();

    if let Err(e) = working_copy.restore(&excluded_paths, cancel) {
        warning!("failed to set excluded files aside, putting them back...");
        rollback(root, &saved);
        return Err(e);
    }

    if let Err(e) = working_copy.commit_all(message, cancel) {
        warning!("commit failed, restoring excluded files...");
        rollback(root, &saved);
        return Err(e);
    }

    // keep going past a failed file so later ones are not left reverted
    let mut failed: Vec<(&SavedFile, io::Error)> = Vec::new();
    for (i, file) in saved.iter().enumerate() {
        if cancel.is_cancelled() {
            let unrestored: Vec<&str> = failed
                .iter()
                .map(|(f, _)| f.path.as_str())
                .chain(saved[i..].iter().map(|f| f.path.as_str()))
                .collect();
            error!("interrupted while restoring excluded files");
            report_unrestored(&unrestored);
            return Err(Error::Cancelled);
        }
        if let Err(e) = file.reapply(working_copy.root()) {
            warning!("failed to restore {}: {}", file.path, e);
            failed.push((file, e));
        }
    }

    let mut failed = failed.into_iter();
    match failed.next() {
        None => Ok(()),
        Some((first, source)) => {
            let paths: Vec<String> = std::iter::once(first)
                .chain(failed.map(|(f, _)| f))
                .map(|f| f.path.clone())
                .collect();
            let unrestored: Vec<&str> = paths.iter().map(String::as_str).collect();
            report_unrestored(&unrestored);
            Err(Error::Recovery { paths, source })
        }
    }
}

/// best effort: failures are logged per file and never mask the caller's error
fn rollback(root: &Path, saved: &[SavedFile]) {
    for file in saved {
        if let Err(e) = file.reapply(root) {
            warning!("failed to restore {}: {}", file.path, e);
        }
    }
}

fn report_unrestored(paths: &[&str]) {
    error!("these files still need to be restored manually:");
    for path in paths {
        info!("  - {}", path);
    }
}

#[cfg(test)]
mod tests;
