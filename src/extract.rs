use crate::constants::CONVENTIONAL_TYPES;

/// isolate the commit message from a raw AI response
///
/// drops any preamble before the first conventional commit header, stops at
/// a bare ``` fence and strips trailing `---` separators. responses without a
/// recognisable header are returned unchanged.
pub fn extract(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').collect();

    let Some(start) = lines.iter().position(|line| is_header(line)) else {
        return raw.to_string();
    };

    let body: Vec<&str> = lines[start..]
        .iter()
        .take_while(|line| line.trim() != "```")
        .copied()
        .collect();

    let mut message = body.join("\n").trim().to_string();
    while let Some(stripped) = message.strip_suffix("---") {
        message = stripped.trim().to_string();
    }
    message
}

/// whether the text contains a conventional commit header line
pub fn is_conventional(text: &str) -> bool {
    text.split('\n').any(is_header)
}

/// `type(`, `type:` or `type!` for a known type
fn is_header(line: &str) -> bool {
    let trimmed = line.trim();
    CONVENTIONAL_TYPES.iter().any(|kind| {
        trimmed
            .strip_prefix(kind)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| matches!(c, '(' | ':' | '!'))
    })
}
