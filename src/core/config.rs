use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::replace::ReplacementRule;
use crate::utils::{io, validation};

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "project-rename.json";

/// Everything one rename run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementOptions {
    #[serde(default)]
    pub source_path: String,

    /// Empty means the current directory.
    #[serde(default)]
    pub output_folder_path: String,

    #[serde(default = "default_ignore_copy_glob_rules")]
    pub ignore_copy_glob_rules: Vec<String>,

    #[serde(default = "default_ignore_replace_glob_rules")]
    pub ignore_replace_glob_rules: Vec<String>,

    #[serde(default = "default_rules")]
    pub rules: Vec<ReplacementRule>,
}

impl Default for ReplacementOptions {
    fn default() -> Self {
        Self {
            source_path: String::new(),
            output_folder_path: String::new(),
            ignore_copy_glob_rules: default_ignore_copy_glob_rules(),
            ignore_replace_glob_rules: default_ignore_replace_glob_rules(),
            rules: default_rules(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_ignore_copy_glob_rules() -> Vec<String> {
    vec![".github/".to_string()]
}

fn default_ignore_replace_glob_rules() -> Vec<String> {
    vec!["fonts/".to_string()]
}

fn default_rules() -> Vec<ReplacementRule> {
    vec![ReplacementRule::new("OldCompanyName", "NewCompanyName")]
}

impl ReplacementOptions {
    /// Overlay command-line values onto loaded options.
    pub fn with_overrides(mut self, source: Option<String>, output: Option<String>) -> Self {
        if let Some(source) = source {
            self.source_path = source;
        }
        if let Some(output) = output {
            self.output_folder_path = output;
        }
        self
    }

    /// Source path with `~` and environment variables expanded.
    pub fn resolved_source(&self) -> Result<PathBuf> {
        let raw = validation::require_non_empty(&self.source_path, "source_path", "Source path is required")
            .map_err(|_| Error::config_missing_key("source_path", None))?;
        expand("source_path", raw)
    }

    /// Output folder with `~` and environment variables expanded.
    pub fn resolved_output_folder(&self) -> Result<PathBuf> {
        let raw = self.output_folder_path.trim();
        if raw.is_empty() {
            return Ok(PathBuf::from("."));
        }
        expand("output_folder_path", raw)
    }

    /// Check the options without touching the source.
    pub fn validate(&self) -> Result<()> {
        self.resolved_source()?;
        self.resolved_output_folder()?;

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.old_value.is_empty() && !rule.new_value.is_empty() {
                log_status!("config", "rules[{}] has no old_value and will be skipped", index);
            }
        }

        Ok(())
    }
}

fn expand(key: &str, raw: &str) -> Result<PathBuf> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.into_owned()))
        .map_err(|e| Error::config_invalid_value(key, Some(raw.to_string()), e.to_string()))
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load options from `path`. A missing file is an error.
pub fn load(path: &Path) -> Result<ReplacementOptions> {
    let content = io::read_file(path, "read config")?;
    serde_json::from_str(&content).map_err(|e| Error::config_invalid_json(path.display().to_string(), e))
}

/// Load options from `path` if given, otherwise from the default file in the
/// working directory, falling back to built-in defaults when it is absent.
pub fn load_or_default(path: Option<&Path>) -> Result<ReplacementOptions> {
    match path {
        Some(path) => load(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                load(path)
            } else {
                log_status!("config", "No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                Ok(ReplacementOptions::default())
            }
        }
    }
}

/// Save options as pretty JSON, creating parent directories.
pub fn save(path: &Path, options: &ReplacementOptions) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            io::create_dir_all(parent, "create config folder")?;
        }
    }

    let content = serde_json::to_string_pretty(options)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize config".to_string())))?;

    io::write_bytes_atomic(path, content.as_bytes(), "write config")
}

/// Bootstrap a config file with built-in defaults.
pub fn write_default(path: &Path, force: bool) -> Result<ReplacementOptions> {
    if path.exists() && !force {
        return Err(Error::config_already_exists(path.display().to_string()));
    }

    let options = ReplacementOptions::default();
    save(path, &options)?;
    log_status!("config", "Wrote default options to {}", path.display());
    Ok(options)
}
