//! Input validation primitives.
//!
//! - Validating non-empty strings
//! - Detecting characters that cannot appear in a file name

use crate::error::{Error, Result};

/// Characters rejected in a file name on at least one supported platform.
///
/// Generated trees are meant to be portable, so the Windows set applies
/// everywhere.
const ILLEGAL_FILE_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Require a string to be non-empty after trimming.
///
/// Returns a reference to the trimmed string on success.
pub fn require_non_empty<'a>(value: &'a str, field: &str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::config_invalid_value(field, None, message))
    } else {
        Ok(trimmed)
    }
}

/// Return the distinct characters in `value` that are illegal in a file name.
pub fn illegal_file_name_chars(value: &str) -> Vec<char> {
    let mut found: Vec<char> = Vec::new();
    for c in value.chars() {
        if (c.is_control() || ILLEGAL_FILE_NAME_CHARS.contains(&c)) && !found.contains(&c) {
            found.push(c);
        }
    }
    found
}
