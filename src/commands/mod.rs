use std::path::{Path, PathBuf};

use project_rename::config::DEFAULT_CONFIG_FILE;

pub type CmdResult<T> = project_rename::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    /// Explicit `--config` path, or the default file in the working directory.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE).to_path_buf())
    }
}

pub mod init;
pub mod run;
pub mod show;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::to_json_result($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (project_rename::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Init(args) => dispatch!(args, global, init),
        crate::Commands::Show(args) => dispatch!(args, global, show),
    }
}
