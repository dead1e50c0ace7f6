use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// errors raised by the backends, providers and interactive loops
#[derive(Error, Debug)]
pub enum Error {
    /// the shared cancellation token fired (SIGINT/SIGTERM or ctrl-c at a prompt)
    #[error("interrupted")]
    Cancelled,

    #[error("`{program}` not found on PATH; {hint}")]
    NotInstalled { program: String, hint: &'static str },

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` failed ({status}){}", stderr_suffix(.stderr))]
    CommandFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("git: {0}")]
    Git(#[from] git2::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("input closed")]
    InputClosed,

    #[error("failed to read input: {0}")]
    ReadInput(String),

    #[error("commit message is empty")]
    EmptyMessage,

    #[error("AI returned an error response: {0}")]
    AiResponse(String),

    #[error("failed to read excluded file {path}: {source}")]
    Capture {
        path: String,
        #[source]
        source: io::Error,
    },

    /// `source` is the first failure; `paths` lists every file left unrestored
    #[error(
        "failed to restore excluded files {}: {source} (manual restoration needed)",
        .paths.join(", ")
    )]
    Recovery {
        paths: Vec<String>,
        #[source]
        source: io::Error,
    },

    #[error("editor `{editor}` exited with {status}")]
    Editor { editor: String, status: ExitStatus },

    #[error("pre-commit hook failed: {0}")]
    Hook(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// install hint for programs gcauto shells out to
pub fn install_hint(program: &str) -> &'static str {
    match program {
        "claude" => "install with: npm install -g @anthropic-ai/claude-code",
        "gemini" => "install with: npm install -g @google/gemini-cli",
        "jj" => "see https://jj-vcs.github.io/jj/latest/install-and-setup/",
        "git" => "install git from your package manager",
        "pre-commit" => "install with: pip install pre-commit",
        _ => "check that it is installed and on PATH",
    }
}
