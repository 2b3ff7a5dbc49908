//! Gitignore-style predicate deciding which paths an operation skips.
//!
//! A gate holds one matcher per registration. Each matcher is anchored at a
//! base directory in the gate's path space (`<root>/...`); a path is tested
//! against every matcher whose base contains it, shallow bases first, and the
//! last definitive answer wins. That gives deeper ignore files the final say
//! and lets `!pattern` re-include what a shallower rule excluded.

use std::path::PathBuf;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::{Error, Result};

/// File name of the per-directory ignore specification.
pub const IGNORE_FILE_NAME: &str = ".gitignore";

struct Matcher {
    base: String,
    depth: usize,
    gitignore: Gitignore,
}

pub struct IgnoreGate {
    label: String,
    matchers: Vec<Matcher>,
}

impl IgnoreGate {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            matchers: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Register configured glob rules anchored at `root_hint`.
    pub fn register_glob_rules<S: AsRef<str>>(&mut self, root_hint: &str, patterns: &[S]) -> Result<()> {
        let origin = format!("{} glob rules", self.label);
        self.register(root_hint, &origin, patterns.iter().map(|p| p.as_ref()))
    }

    /// Register the lines of an ignore file found at `path`; its rules are
    /// anchored at the file's directory.
    pub fn register_ignore_file<S: AsRef<str>>(&mut self, path: &str, lines: &[S]) -> Result<()> {
        let base = match path.trim_end_matches('/').rfind('/') {
            Some(idx) => &path[..idx],
            None => "",
        };
        let base = base.to_string();
        self.register(&base, path, lines.iter().map(|l| l.as_ref()))
    }

    /// Whether `path` (in gate path space) is excluded by any registered rule.
    pub fn is_ignored(&self, path: &str, is_dir: bool) -> bool {
        let path = path.trim_matches('/');
        let mut ignored = false;

        for matcher in &self.matchers {
            let Some(relative) = relative_to(&matcher.base, path) else {
                continue;
            };
            if relative.is_empty() {
                continue;
            }
            let matched = matcher
                .gitignore
                .matched_path_or_any_parents(relative, is_dir);
            if matched.is_ignore() {
                ignored = true;
            } else if matched.is_whitelist() {
                ignored = false;
            }
        }

        ignored
    }

    fn register<'a>(
        &mut self,
        base: &str,
        origin: &str,
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<()> {
        let base = base.trim_matches('/').to_string();
        let mut builder = GitignoreBuilder::new(".");
        let mut count = 0usize;

        for line in lines {
            let line = line.trim_end_matches('\r');
            builder
                .add_line(Some(PathBuf::from(origin)), line)
                .map_err(|e| Error::ignore_invalid_pattern(&self.label, origin, line, e.to_string()))?;
            count += 1;
        }

        let gitignore = builder
            .build()
            .map_err(|e| Error::ignore_invalid_pattern(&self.label, origin, "", e.to_string()))?;

        if gitignore.is_empty() {
            return Ok(());
        }

        log_status!(
            "ignore",
            "{} gate: {} rule(s) from {} anchored at '{}'",
            self.label,
            count,
            origin,
            base
        );

        let depth = if base.is_empty() { 0 } else { base.split('/').count() };
        let position = self
            .matchers
            .iter()
            .position(|m| m.depth > depth)
            .unwrap_or(self.matchers.len());
        self.matchers.insert(
            position,
            Matcher {
                base,
                depth,
                gitignore,
            },
        );
        Ok(())
    }
}

fn relative_to<'a>(base: &str, path: &'a str) -> Option<&'a str> {
    if base.is_empty() {
        return Some(path);
    }
    if path == base {
        return Some("");
    }
    path.strip_prefix(base)?.strip_prefix('/')
}
