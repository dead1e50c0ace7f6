use std::time::Duration;

// prompt
pub const MAX_DIFF_BYTES: usize = 50_000;
pub const DIFF_TRUNCATED_MARKER: &str = "...(diff truncated for size)...";

// commit message
pub const CONVENTIONAL_TYPES: [&str; 11] = [
    "feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci", "chore", "revert",
];
pub const AI_ERROR_PHRASES: [&str; 3] = ["execution error", "error:", "failed"];

// providers
pub const CLAUDE_NOISE: [&str; 2] = ["🤖 Generated with", "Co-Authored-By: Claude"];
pub const GEMINI_NOISE: [&str; 1] = ["Loaded cached credentials."];

// processes
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

// editor
pub const DEFAULT_EDITOR: &str = "vi";

// file selection
pub const MIN_FILES_FOR_SELECTION: usize = 2;
