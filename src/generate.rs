use crate::cancel::CancelToken;
use crate::changeset::ChangeSet;
use crate::constants::{AI_ERROR_PHRASES, DIFF_TRUNCATED_MARKER, MAX_DIFF_BYTES};
use crate::error::{Error, Result};
use crate::extract::{extract, is_conventional};
use crate::provider::TextGenerator;
use crate::{info, warning};
use colored::Colorize;
use num_format::{Locale, ToFormattedString};

/// the diff as sent to the model, and whether it was cut short
pub fn truncate_diff(diff: &str) -> (&str, bool) {
    if diff.len() <= MAX_DIFF_BYTES {
        return (diff, false);
    }
    let mut end = MAX_DIFF_BYTES;
    while !diff.is_char_boundary(end) {
        end -= 1;
    }
    (&diff[..end], true)
}

pub fn get_prompt(changes: &ChangeSet) -> String {
    let (diff, truncated) = truncate_diff(&changes.diff);
    let marker = if truncated {
        format!("\n{DIFF_TRUNCATED_MARKER}")
    } else {
        String::new()
    };
    let note = if truncated {
        "\nNOTE: the diff was truncated because of its size. rely on the changed \
         files and the stat summary for the overall picture.\n"
    } else {
        ""
    };

    format!(
        r#"
Write a commit message for the changes below, following the Conventional Commits specification.

FORMAT:
<type>(<scope>): <subject>

<body>

<footer>

RULES:
- type is one of: feat, fix, docs, style, refactor, perf, test, build, ci, chore, revert
- scope is optional and names the affected area (a module or directory)
- subject is imperative, lowercase, without a trailing period, at most 50 characters
- body is optional; explain what changed and why, as bullets starting with "  - "
- for breaking changes add a footer starting with "BREAKING CHANGE: "

OUTPUT:
- reply with the commit message only
- no preamble, no explanation, no code fences, no markdown

CHANGED FILES:
{files}

STAT:
{stat}
{note}
DIFF:
{diff}{marker}
"#,
        files = changes.files,
        stat = changes.stat,
    )
    .trim()
    .to_string()
}

/// ask the generator for a message describing `changes`
///
/// the reply is run through [`extract`] and [`validate`] before it is
/// returned.
pub fn generate(
    generator: &dyn TextGenerator,
    changes: &ChangeSet,
    cancel: &CancelToken,
    show_prompt: bool,
    show_response: bool,
) -> Result<String> {
    if changes.diff.len() > MAX_DIFF_BYTES {
        warning!(
            "diff is {} bytes, only the first {} are sent",
            changes.diff.len().to_formatted_string(&Locale::en),
            MAX_DIFF_BYTES.to_formatted_string(&Locale::en)
        );
    }

    let prompt = get_prompt(changes);
    if show_prompt {
        info!("\n{}", prompt.dimmed());
    }

    let raw = generator.execute(&prompt, cancel)?;
    if show_response {
        info!("\n{}", raw.dimmed());
    }

    validate(extract(&raw))
}

/// reject replies that are empty or look like an error report
///
/// the error heuristic only applies when no conventional header was found,
/// so "fix: handle failed uploads" is accepted.
pub fn validate(message: String) -> Result<String> {
    if message.trim().is_empty() {
        return Err(Error::EmptyMessage);
    }
    if !is_conventional(&message) {
        let lower = message.to_lowercase();
        if AI_ERROR_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
            return Err(Error::AiResponse(message));
        }
        warning!("response does not follow the conventional commits format");
    }
    Ok(message)
}
