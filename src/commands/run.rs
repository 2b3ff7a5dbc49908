use clap::Args;
use serde::Serialize;

use project_rename::config;
use project_rename::log_status;
use project_rename::{RenameReport, Renamer, ReplacementOptions};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct RunArgs {
    /// Override the configured source directory or .zip archive
    #[arg(long)]
    pub source: Option<String>,

    /// Override the configured output folder
    #[arg(long)]
    pub output: Option<String>,

    /// Skip the interactive confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub command: &'static str,
    pub confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RenameReport>,
}

pub fn run(args: RunArgs, global: &GlobalArgs) -> CmdResult<RunOutput> {
    let options = config::load_or_default(global.config.as_deref())?.with_overrides(args.source, args.output);
    options.validate()?;

    if !args.yes && crate::tty::require_tty_for_interactive() && !confirm(&options)? {
        return Ok((
            RunOutput {
                command: "run",
                confirmed: false,
                report: None,
            },
            0,
        ));
    }

    let report = Renamer::new(options).run()?;
    log_status!("rename", "Done in {} ms: {}", report.elapsed_ms, report.destination);

    Ok((
        RunOutput {
            command: "run",
            confirmed: true,
            report: Some(report),
        },
        0,
    ))
}

fn confirm(options: &ReplacementOptions) -> project_rename::Result<bool> {
    let pretty = serde_json::to_string_pretty(options).map_err(|e| {
        project_rename::Error::internal_json(e.to_string(), Some("render options".to_string()))
    })?;
    eprintln!("{}", pretty);
    crate::tty::confirm("Proceed with these options? [y/N] ")
}
