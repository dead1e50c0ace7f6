use std::fmt;

/// how a file differs from its last recorded state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Modified,
    Added,
    Deleted,
}

impl FileStatus {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'M' => Some(Self::Modified),
            'A' => Some(Self::Added),
            'D' => Some(Self::Deleted),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Self::Modified => 'M',
            Self::Added => 'A',
            Self::Deleted => 'D',
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// a single changed file, identified by its path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub status: FileStatus,
    pub path: String, // relative to the working directory
}

impl FileEntry {
    pub fn new(status: FileStatus, path: impl Into<String>) -> Self {
        Self {
            status,
            path: path.into(),
        }
    }
}

/// the pending changes handed to the generator, read fresh per run
#[derive(Debug)]
pub struct ChangeSet {
    pub diff: String,
    pub files: String, // newline separated
    pub stat: String,
}
