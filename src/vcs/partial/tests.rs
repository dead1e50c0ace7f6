use super::*;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use tempfile::TempDir;

/// working copy backed by a temp dir; `restore` rewrites files to `base`
struct FakeCopy {
    dir: TempDir,
    base: HashMap<String, Option<Vec<u8>>>, // None = absent in the parent
    restores: RefCell<Vec<Vec<String>>>,
    commits: RefCell<Vec<String>>,
    fail_restore: bool,
    fail_commit: bool,
    cancel_on_commit: Option<CancelToken>,
    // after the commit, a regular file is put here to block a write-back
    block_after_commit: Option<&'static str>,
    // fired when the first write-back asks for the root
    cancel_on_write_back: Option<CancelToken>,
    committed: Cell<bool>,
}

impl FakeCopy {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            base: HashMap::new(),
            restores: RefCell::new(Vec::new()),
            commits: RefCell::new(Vec::new()),
            fail_restore: false,
            fail_commit: false,
            cancel_on_commit: None,
            block_after_commit: None,
            cancel_on_write_back: None,
            committed: Cell::new(false),
        }
    }

    /// record the parent version and the current on-disk version of a file
    fn file(&mut self, path: &str, base: Option<&str>, current: Option<&str>) {
        self.base
            .insert(path.to_string(), base.map(|b| b.as_bytes().to_vec()));
        let full = self.dir.path().join(path);
        match current {
            Some(content) => {
                fs::create_dir_all(full.parent().unwrap()).unwrap();
                fs::write(&full, content).unwrap();
            }
            None => {
                let _ = fs::remove_file(&full);
            }
        }
    }

    fn read(&self, path: &str) -> Option<String> {
        fs::read_to_string(self.dir.path().join(path)).ok()
    }
}

impl WorkingCopy for FakeCopy {
    fn root(&self) -> &Path {
        if self.committed.get()
            && let Some(token) = &self.cancel_on_write_back
        {
            token.cancel();
        }
        self.dir.path()
    }

    fn restore(&self, paths: &[String], _cancel: &CancelToken) -> Result<()> {
        self.restores.borrow_mut().push(paths.to_vec());
        if self.fail_restore {
            // fail halfway through, after touching the first file
            let first = self.dir.path().join(&paths[0]);
            let _ = fs::remove_file(first);
            return Err(Error::Io(io::Error::other("restore rejected")));
        }
        for path in paths {
            let full = self.dir.path().join(path);
            let _ = fs::remove_file(&full);
            match &self.base[path] {
                Some(bytes) => fs::write(&full, bytes).unwrap(),
                None => {
                    // jj drops directories that become empty
                    if let Some(parent) = full.parent()
                        && parent != self.dir.path()
                    {
                        let _ = fs::remove_dir(parent);
                    }
                }
            }
        }
        Ok(())
    }

    fn commit_all(&self, message: &str, _cancel: &CancelToken) -> Result<()> {
        self.commits.borrow_mut().push(message.to_string());
        if let Some(token) = &self.cancel_on_commit {
            token.cancel();
        }
        if self.fail_commit {
            return Err(Error::Io(io::Error::other("commit rejected")));
        }
        if let Some(path) = self.block_after_commit {
            fs::write(self.dir.path().join(path), "in the way").unwrap();
        }
        self.committed.set(true);
        Ok(())
    }
}

fn entry(status: FileStatus, path: &str) -> FileEntry {
    FileEntry::new(status, path)
}

/// three changed files: one selected, two excluded (modified + deleted)
fn three_file_copy() -> (FakeCopy, Vec<FileEntry>) {
    let mut copy = FakeCopy::new();
    copy.file("keep.rs", Some("keep v1"), Some("keep v2"));
    copy.file("later.rs", Some("later v1"), Some("later v2 work in progress"));
    copy.file("gone.rs", Some("gone v1"), None);
    let all = vec![
        entry(FileStatus::Modified, "keep.rs"),
        entry(FileStatus::Modified, "later.rs"),
        entry(FileStatus::Deleted, "gone.rs"),
    ];
    (copy, all)
}

#[test]
fn test_excluded_files_survive_successful_commit() {
    let (copy, all) = three_file_copy();
    let cancel = CancelToken::new();

    partial_commit(&copy, "feat: keep", &["keep.rs".to_string()], &all, &cancel).unwrap();

    assert_eq!(
        copy.restores.borrow().as_slice(),
        [vec!["later.rs".to_string(), "gone.rs".to_string()]]
    );
    assert_eq!(copy.commits.borrow().as_slice(), ["feat: keep"]);
    assert_eq!(copy.read("keep.rs").as_deref(), Some("keep v2"));
    assert_eq!(
        copy.read("later.rs").as_deref(),
        Some("later v2 work in progress")
    );
    assert_eq!(copy.read("gone.rs"), None);
}

#[test]
fn test_excluded_files_restored_when_commit_fails() {
    let (mut copy, all) = three_file_copy();
    copy.fail_commit = true;

    let err = partial_commit(
        &copy,
        "feat: keep",
        &["keep.rs".to_string()],
        &all,
        &CancelToken::new(),
    )
    .unwrap_err();

    assert!(err.to_string().contains("commit rejected"), "{err}");
    assert_eq!(
        copy.read("later.rs").as_deref(),
        Some("later v2 work in progress")
    );
    assert_eq!(copy.read("gone.rs"), None);
}

#[test]
fn test_excluded_files_restored_when_restore_fails() {
    let (mut copy, all) = three_file_copy();
    copy.fail_restore = true;

    let err = partial_commit(
        &copy,
        "feat: keep",
        &["keep.rs".to_string()],
        &all,
        &CancelToken::new(),
    )
    .unwrap_err();

    assert!(err.to_string().contains("restore rejected"), "{err}");
    assert!(copy.commits.borrow().is_empty());
    assert_eq!(
        copy.read("later.rs").as_deref(),
        Some("later v2 work in progress")
    );
}

#[test]
fn test_nothing_excluded_is_a_plain_commit() {
    let (copy, all) = three_file_copy();
    let selected: Vec<String> = all.iter().map(|e| e.path.clone()).collect();

    partial_commit(&copy, "chore: all", &selected, &all, &CancelToken::new()).unwrap();

    assert!(copy.restores.borrow().is_empty());
    assert_eq!(copy.commits.borrow().as_slice(), ["chore: all"]);
}

#[test]
fn test_unreadable_excluded_file_aborts_before_any_change() {
    let mut copy = FakeCopy::new();
    copy.file("keep.rs", Some("a"), Some("b"));
    // reported as modified but missing on disk
    copy.file("ghost.rs", Some("old"), None);
    let all = vec![
        entry(FileStatus::Modified, "keep.rs"),
        entry(FileStatus::Modified, "ghost.rs"),
    ];

    let err = partial_commit(
        &copy,
        "fix: x",
        &["keep.rs".to_string()],
        &all,
        &CancelToken::new(),
    )
    .unwrap_err();

    assert!(matches!(err, Error::Capture { ref path, .. } if path == "ghost.rs"));
    assert!(copy.restores.borrow().is_empty());
    assert!(copy.commits.borrow().is_empty());
}

#[test]
fn test_added_file_in_new_directory_is_recreated() {
    let mut copy = FakeCopy::new();
    copy.file("keep.rs", Some("a"), Some("b"));
    copy.file("fresh/module/new.rs", None, Some("brand new"));
    let all = vec![
        entry(FileStatus::Modified, "keep.rs"),
        entry(FileStatus::Added, "fresh/module/new.rs"),
    ];

    partial_commit(
        &copy,
        "fix: x",
        &["keep.rs".to_string()],
        &all,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(copy.read("fresh/module/new.rs").as_deref(), Some("brand new"));
}

#[test]
fn test_cancel_during_restoration_reports_cancelled() {
    let (mut copy, all) = three_file_copy();
    let cancel = CancelToken::new();
    copy.cancel_on_commit = Some(cancel.clone());

    let err = partial_commit(&copy, "feat: keep", &["keep.rs".to_string()], &all, &cancel)
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(copy.commits.borrow().len(), 1);
    // the write-back never started, so the excluded file is still reverted
    assert_eq!(copy.read("later.rs").as_deref(), Some("later v1"));
}

#[test]
fn test_cancel_midway_restores_earlier_files_only() {
    let (mut copy, all) = three_file_copy();
    let cancel = CancelToken::new();
    copy.cancel_on_write_back = Some(cancel.clone());

    let err = partial_commit(&copy, "feat: keep", &["keep.rs".to_string()], &all, &cancel)
        .unwrap_err();

    assert!(err.is_cancelled());
    // later.rs was written back before the token was seen
    assert_eq!(
        copy.read("later.rs").as_deref(),
        Some("later v2 work in progress")
    );
    // gone.rs was not: the restore brought back its parent version
    assert_eq!(copy.read("gone.rs").as_deref(), Some("gone v1"));
}

#[test]
fn test_failed_write_back_continues_and_names_every_failure() {
    let mut copy = FakeCopy::new();
    copy.file("keep.rs", Some("a"), Some("b"));
    copy.file("blocked/new.rs", None, Some("brand new"));
    copy.file("later.rs", Some("later v1"), Some("later v2 work"));
    // a file where the directory of blocked/new.rs must be recreated
    copy.block_after_commit = Some("blocked");
    let all = vec![
        entry(FileStatus::Modified, "keep.rs"),
        entry(FileStatus::Added, "blocked/new.rs"),
        entry(FileStatus::Modified, "later.rs"),
    ];

    let err = partial_commit(
        &copy,
        "fix: x",
        &["keep.rs".to_string()],
        &all,
        &CancelToken::new(),
    )
    .unwrap_err();

    match &err {
        Error::Recovery { paths, .. } => assert_eq!(paths, &["blocked/new.rs"]),
        other => panic!("expected a recovery error, got {other}"),
    }
    assert!(err.to_string().contains("blocked/new.rs"), "{err}");
    assert_eq!(copy.commits.borrow().as_slice(), ["fix: x"]);
    // the failure did not stop the files after it
    assert_eq!(copy.read("later.rs").as_deref(), Some("later v2 work"));
}

#[cfg(unix)]
#[test]
fn test_permissions_are_preserved() {
    use std::os::unix::fs::PermissionsExt;

    let mut copy = FakeCopy::new();
    copy.file("keep.rs", Some("a"), Some("b"));
    copy.file("run.sh", Some("#!/bin/sh\n"), Some("#!/bin/sh\necho hi\n"));
    let script = copy.dir.path().join("run.sh");
    fs::set_permissions(&script, Permissions::from_mode(0o755)).unwrap();
    let all = vec![
        entry(FileStatus::Modified, "keep.rs"),
        entry(FileStatus::Modified, "run.sh"),
    ];

    partial_commit(
        &copy,
        "fix: x",
        &["keep.rs".to_string()],
        &all,
        &CancelToken::new(),
    )
    .unwrap();

    let mode = fs::metadata(&script).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
    assert_eq!(copy.read("run.sh").as_deref(), Some("#!/bin/sh\necho hi\n"));
}
