//! Text helpers shared by the replacement engine.

/// Line terminator of the platform the output is produced on.
#[cfg(windows)]
pub const NEWLINE: &str = "\r\n";
#[cfg(not(windows))]
pub const NEWLINE: &str = "\n";

/// Collapse `\r\n`, `\r` and `\n` into `newline`.
pub fn normalize_line_endings_to(text: &str, newline: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str(newline);
            }
            '\n' => out.push_str(newline),
            other => out.push(other),
        }
    }
    out
}

/// Collapse every line terminator into the platform convention.
pub fn normalize_line_endings(text: &str) -> String {
    normalize_line_endings_to(text, NEWLINE)
}

/// Split a slash-separated path into its parent prefix (with trailing `/`)
/// and last segment. A trailing `/` on the input is ignored.
pub fn split_last_segment(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => (&trimmed[..=idx], &trimmed[idx + 1..]),
        None => ("", trimmed),
    }
}
