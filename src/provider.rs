use crate::cancel::CancelToken;
use crate::constants::{CLAUDE_NOISE, GEMINI_NOISE};
use crate::error::{Error, Result, install_hint};
use crate::process;
use clap::ValueEnum;
use std::fmt;
use std::process::Command;

/// one-shot text generation from a prompt
pub trait TextGenerator {
    fn execute(&self, prompt: &str, cancel: &CancelToken) -> Result<String>;
}

/// AI command line tools that can write the commit message
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    Claude,
    Gemini,
}

impl Provider {
    pub fn program(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Gemini => "gemini",
        }
    }

    /// fail early, with an install hint, when the CLI is not on PATH
    pub fn ensure_installed(self) -> Result<()> {
        let program = self.program();
        which::which(program)
            .map(|_| ())
            .map_err(|_| Error::NotInstalled {
                program: program.to_string(),
                hint: install_hint(program),
            })
    }

    /// lines the CLI adds to its output that never belong in a commit
    fn noise(self) -> &'static [&'static str] {
        match self {
            Self::Claude => &CLAUDE_NOISE,
            Self::Gemini => &GEMINI_NOISE,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl TextGenerator for Provider {
    fn execute(&self, prompt: &str, cancel: &CancelToken) -> Result<String> {
        let mut cmd = Command::new(self.program());
        let raw = match self {
            // prompt on stdin, keeps large diffs off the argument list
            Self::Claude => {
                cmd.arg("-p");
                process::run(&mut cmd, Some(prompt.as_bytes()), cancel)?
            }
            Self::Gemini => {
                cmd.arg("-p").arg(prompt);
                process::run(&mut cmd, None, cancel)?
            }
        };
        Ok(strip_noise(&raw, self.noise()))
    }
}

fn strip_noise(raw: &str, markers: &[&str]) -> String {
    raw.lines()
        .filter(|line| !markers.iter().any(|marker| line.contains(marker)))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
