use clap::Args;
use serde::Serialize;

use project_rename::config;
use project_rename::ReplacementOptions;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub command: &'static str,
    pub path: String,
    pub options: ReplacementOptions,
    pub next_steps: Vec<String>,
}

pub fn run(args: InitArgs, global: &GlobalArgs) -> CmdResult<InitOutput> {
    let path = global.config_path();
    let options = config::write_default(&path, args.force)?;

    Ok((
        InitOutput {
            command: "init",
            path: path.display().to_string(),
            options,
            next_steps: vec![
                "Set source_path to the project folder or .zip archive".to_string(),
                "Edit rules to map old names to new names".to_string(),
                "Run `project-rename run`".to_string(),
            ],
        },
        0,
    ))
}
