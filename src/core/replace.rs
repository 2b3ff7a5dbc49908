//! Replacement engine: ordered, chained substitution over entry names and
//! text contents.
//!
//! Rules are applied in list order and each rule sees the output of the one
//! before it, so `A -> B` followed by `B -> C` turns `A` into `C`. Callers rely
//! on that ordering; reordering rules changes results.

use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::entry::{Entry, Payload};
use crate::error::{Error, Result};
use crate::utils::text::{normalize_line_endings, split_last_segment};
use crate::utils::validation::illegal_file_name_chars;

/// One configured substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplacementRule {
    #[serde(default)]
    pub old_value: String,
    #[serde(default)]
    pub new_value: String,
    #[serde(default = "default_true")]
    pub match_case: bool,
    #[serde(default = "default_true")]
    pub replace_name: bool,
    #[serde(default = "default_true")]
    pub replace_content: bool,
}

fn default_true() -> bool {
    true
}

impl ReplacementRule {
    pub fn new(old_value: impl Into<String>, new_value: impl Into<String>) -> Self {
        Self {
            old_value: old_value.into(),
            new_value: new_value.into(),
            match_case: true,
            replace_name: true,
            replace_content: true,
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.match_case = false;
        self
    }

    pub fn names_only(mut self) -> Self {
        self.replace_content = false;
        self
    }

    pub fn contents_only(mut self) -> Self {
        self.replace_name = false;
        self
    }

    /// A rule that can never change anything.
    pub fn is_inert(&self) -> bool {
        self.old_value.is_empty() || self.new_value.is_empty() || self.old_value == self.new_value
    }
}

struct ActiveRule {
    rule: ReplacementRule,
    /// Case-insensitive matcher; `None` for ordinal rules.
    matcher: Option<Regex>,
}

impl ActiveRule {
    fn compile(rule: ReplacementRule) -> Result<Self> {
        let matcher = if rule.match_case {
            None
        } else {
            let regex = RegexBuilder::new(&regex::escape(&rule.old_value))
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    Error::config_invalid_value("rules", Some(rule.old_value.clone()), e.to_string())
                })?;
            Some(regex)
        };
        Ok(Self { rule, matcher })
    }

    fn apply(&self, text: &str) -> String {
        match &self.matcher {
            Some(regex) => regex
                .replace_all(text, NoExpand(self.rule.new_value.as_str()))
                .into_owned(),
            None => text.replace(&self.rule.old_value, &self.rule.new_value),
        }
    }
}

/// Result of running one entry through the engine.
#[derive(Debug, Clone)]
pub struct Replaced {
    pub entry: Entry,
    pub renamed: bool,
    pub rewritten: bool,
}

/// The active, de-duplicated rule list.
pub struct RuleSet {
    rules: Vec<ActiveRule>,
}

impl RuleSet {
    /// Drop inert rules and structural duplicates, keeping first-seen order.
    pub fn new(rules: &[ReplacementRule]) -> Result<Self> {
        let mut active: Vec<ActiveRule> = Vec::new();
        for rule in rules {
            if rule.is_inert() || active.iter().any(|a| &a.rule == rule) {
                continue;
            }
            active.push(ActiveRule::compile(rule.clone())?);
        }
        Ok(Self { rules: active })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn rules(&self) -> impl Iterator<Item = &ReplacementRule> {
        self.rules.iter().map(|a| &a.rule)
    }

    pub fn has_name_rules(&self) -> bool {
        self.rules.iter().any(|a| a.rule.replace_name)
    }

    pub fn has_content_rules(&self) -> bool {
        self.rules.iter().any(|a| a.rule.replace_content)
    }

    /// Chain every content rule over `text` and normalize line endings.
    pub fn replace_content(&self, text: &str) -> String {
        let replaced = self
            .rules
            .iter()
            .filter(|a| a.rule.replace_content)
            .fold(text.to_string(), |acc, a| a.apply(&acc));
        normalize_line_endings(&replaced)
    }

    /// Chain every name rule over `name`.
    ///
    /// A rule that changes the name must have a replacement value that is
    /// legal in a file name; otherwise the rename fails.
    pub fn rename(&self, name: &str) -> Result<String> {
        let mut current = name.to_string();
        for active in self.rules.iter().filter(|a| a.rule.replace_name) {
            let next = active.apply(&current);
            if next == current {
                continue;
            }
            let illegal = illegal_file_name_chars(&active.rule.new_value);
            if !illegal.is_empty() {
                return Err(Error::rename_illegal_name(
                    name,
                    active.rule.old_value.clone(),
                    active.rule.new_value.clone(),
                    illegal,
                ));
            }
            if let Some(segment) = reserved_segment(&next) {
                return Err(Error::rename_reserved_name(
                    name,
                    active.rule.old_value.clone(),
                    active.rule.new_value.clone(),
                    segment,
                ));
            }
            current = next;
        }
        Ok(current)
    }

    /// Produce the transformed version of `entry`.
    ///
    /// An exempt entry keeps its own name and its content; only its ancestor
    /// directories are renamed.
    pub fn apply(&self, entry: &Entry, exempt: bool) -> Result<Replaced> {
        if self.is_empty() {
            return Ok(unchanged(entry));
        }

        if exempt {
            return self.apply_prefix_only(entry);
        }

        let new_path = if self.has_name_rules() {
            self.rename(entry.path())?
        } else {
            entry.path().to_string()
        };

        let new_bytes = match entry.classify() {
            Payload::Text(text) if self.has_content_rules() => {
                Some(self.replace_content(text).into_bytes())
            }
            Payload::Text(_) | Payload::Binary | Payload::Directory => None,
        };

        let mut result = entry.clone();
        if new_path != entry.path() {
            result = result.with_path(&new_path);
        }
        if let Some(bytes) = new_bytes {
            if bytes != entry.bytes() {
                result = result.with_bytes(bytes);
            }
        }

        let renamed = result.path() != entry.path();
        let rewritten = result.bytes() != entry.bytes();
        Ok(Replaced {
            entry: result,
            renamed,
            rewritten,
        })
    }

    fn apply_prefix_only(&self, entry: &Entry) -> Result<Replaced> {
        let (prefix, last) = split_last_segment(entry.path());
        if prefix.is_empty() || !self.has_name_rules() {
            return Ok(unchanged(entry));
        }

        let new_prefix = self.rename(prefix)?;
        let new_prefix = new_prefix.trim_end_matches('/');
        if new_prefix.is_empty() {
            return Ok(unchanged(entry));
        }

        let result = entry.with_path(format!("{}/{}", new_prefix, last));
        let renamed = result.path() != entry.path();
        Ok(Replaced {
            entry: result,
            renamed,
            rewritten: false,
        })
    }
}

/// First segment of `path` that cannot name a file or directory.
fn reserved_segment(path: &str) -> Option<&str> {
    path.trim_end_matches('/')
        .split('/')
        .find(|segment| segment.is_empty() || *segment == "." || *segment == "..")
}

fn unchanged(entry: &Entry) -> Replaced {
    Replaced {
        entry: entry.clone(),
        renamed: false,
        rewritten: false,
    }
}
