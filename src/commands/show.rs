use clap::Args;
use serde::Serialize;

use project_rename::config;
use project_rename::ReplacementOptions;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ShowArgs {}

#[derive(Debug, Serialize)]
pub struct ShowOutput {
    pub command: &'static str,
    pub source: String,
    pub output_folder: String,
    pub options: ReplacementOptions,
}

pub fn run(_args: ShowArgs, global: &GlobalArgs) -> CmdResult<ShowOutput> {
    let options = config::load_or_default(global.config.as_deref())?;
    options.validate()?;

    Ok((
        ShowOutput {
            command: "show",
            source: options.resolved_source()?.display().to_string(),
            output_folder: options.resolved_output_folder()?.display().to_string(),
            options,
        },
        0,
    ))
}
