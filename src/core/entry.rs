//! The unit of work flowing through the pipeline.

use std::fmt;

/// How far into a payload the binary heuristic looks for a NUL byte.
const BINARY_SNIFF_LEN: usize = 8000;

/// One file or directory in the virtual tree.
///
/// Paths are root-relative, `/`-separated, and directories end with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    path: String,
    bytes: Vec<u8>,
    is_dir: bool,
}

/// Result of classifying an entry's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    Directory,
    Binary,
    Text(&'a str),
}

impl Entry {
    pub fn file(path: impl AsRef<str>, bytes: Vec<u8>) -> Self {
        Self {
            path: normalize_path(path.as_ref(), false),
            bytes,
            is_dir: false,
        }
    }

    pub fn directory(path: impl AsRef<str>) -> Self {
        Self {
            path: normalize_path(path.as_ref(), true),
            bytes: Vec::new(),
            is_dir: true,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Final path segment without the directory marker.
    pub fn name(&self) -> &str {
        crate::utils::text::split_last_segment(&self.path).1
    }

    /// Path without the trailing directory marker.
    pub fn trimmed_path(&self) -> &str {
        self.path.trim_end_matches('/')
    }

    pub fn classify(&self) -> Payload<'_> {
        if self.is_dir {
            return Payload::Directory;
        }
        let sniff = &self.bytes[..self.bytes.len().min(BINARY_SNIFF_LEN)];
        if sniff.contains(&0) {
            return Payload::Binary;
        }
        match std::str::from_utf8(&self.bytes) {
            Ok(text) => Payload::Text(text),
            Err(_) => Payload::Binary,
        }
    }

    /// New entry with the same payload under a different path.
    pub fn with_path(&self, path: impl AsRef<str>) -> Self {
        Self {
            path: normalize_path(path.as_ref(), self.is_dir),
            bytes: self.bytes.clone(),
            is_dir: self.is_dir,
        }
    }

    /// New entry with the same path and different payload.
    pub fn with_bytes(&self, bytes: Vec<u8>) -> Self {
        Self {
            path: self.path.clone(),
            bytes,
            is_dir: self.is_dir,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dir {
            write!(f, "{}", self.path)
        } else {
            write!(f, "{} ({} bytes)", self.path, self.bytes.len())
        }
    }
}

/// Canonical form: `/` separators, no leading `/` or `./`, no doubled
/// separators, trailing `/` exactly when `is_dir`.
pub fn normalize_path(raw: &str, is_dir: bool) -> String {
    let unified = raw.replace('\\', "/");
    let segments: Vec<&str> = unified
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    let mut path = segments.join("/");
    if is_dir && !path.is_empty() {
        path.push('/');
    }
    path
}
