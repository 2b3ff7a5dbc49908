//! Pipeline orchestration: source to gates to replacement engine to sink.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::config::ReplacementOptions;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::gate::IgnoreGate;
use crate::replace::RuleSet;
use crate::sink::{resolve_destination, ArchiveSink, CommitSummary, DirectorySink, OutputSink};
use crate::source::{self, SourceKind, TreeSource};

#[derive(Debug, Clone, Serialize)]
pub struct RenameReport {
    pub source: String,
    pub destination: String,
    pub kind: SourceKind,
    pub read: usize,
    pub skipped: usize,
    pub written: usize,
    pub renamed: usize,
    pub rewritten: usize,
    pub output: CommitSummary,
    pub elapsed_ms: u128,
}

/// Counters collected while filtering and transforming entries.
#[derive(Debug, Default)]
struct Tally {
    read: usize,
    skipped: usize,
    renamed: usize,
    rewritten: usize,
}

pub struct Renamer {
    options: ReplacementOptions,
}

impl Renamer {
    pub fn new(options: ReplacementOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReplacementOptions {
        &self.options
    }

    /// Run one full rename. Gates are built fresh for every call, so a
    /// `Renamer` can be run repeatedly without state leaking between runs.
    pub fn run(&self) -> Result<RenameReport> {
        let started = Instant::now();

        self.options.validate()?;
        let rules = RuleSet::new(&self.options.rules)?;
        let source_path = self.options.resolved_source()?;
        let mut source = source::open(&source_path)?;
        let root = source.root_name().to_string();

        let mut copy_gate = IgnoreGate::new("copy");
        copy_gate.register_glob_rules(&root, &self.options.ignore_copy_glob_rules)?;
        let mut replace_gate = IgnoreGate::new("replace");
        replace_gate.register_glob_rules(&root, &self.options.ignore_replace_glob_rules)?;

        log_status!("rename", "Reading {}", source_path.display());
        let entries = source.ingest(&mut copy_gate)?;

        let (output, tally) = transform(source.as_ref(), &entries, &rules, &copy_gate, &replace_gate)?;

        let final_name = rules.rename(source.source_name())?;
        let output_root = self.options.resolved_output_folder()?;
        let destination = resolve_destination(&output_root, &final_name);
        check_overlap(&source_path, &destination)?;
        log_status!("rename", "Writing {} entries to {}", output.len(), destination.display());

        let mut sink: Box<dyn OutputSink> = match source.kind() {
            SourceKind::Directory => Box::new(DirectorySink::new(destination)),
            SourceKind::Archive => Box::new(ArchiveSink::new(destination)),
        };

        let summary = match sink.commit(&output) {
            Ok(summary) => summary,
            Err(err) => {
                if let Err(rollback_err) = sink.rollback() {
                    log_status!("rollback", "Rollback incomplete: {}", rollback_err);
                }
                return Err(err);
            }
        };

        Ok(RenameReport {
            source: source_path.display().to_string(),
            destination: sink.destination().display().to_string(),
            kind: source.kind(),
            read: tally.read,
            skipped: tally.skipped,
            written: output.len(),
            renamed: tally.renamed,
            rewritten: tally.rewritten,
            output: summary,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }
}

/// Drop copy-ignored entries and run the rest through the engine, keeping
/// source order.
fn transform(
    source: &dyn TreeSource,
    entries: &[Entry],
    rules: &RuleSet,
    copy_gate: &IgnoreGate,
    replace_gate: &IgnoreGate,
) -> Result<(Vec<Entry>, Tally)> {
    let mut tally = Tally::default();
    let mut output = Vec::with_capacity(entries.len());

    for entry in entries {
        tally.read += 1;
        let gate_path = source.gate_path(entry.path());

        if copy_gate.is_ignored(&gate_path, entry.is_dir()) {
            tally.skipped += 1;
            log_status!("skip", "{}", entry.path());
            continue;
        }

        let exempt = replace_gate.is_ignored(&gate_path, entry.is_dir());
        let replaced = rules.apply(entry, exempt)?;
        if replaced.renamed {
            tally.renamed += 1;
        }
        if replaced.rewritten {
            tally.rewritten += 1;
        }
        log_status!("entry", "{} -> {}", entry.path(), replaced.entry.path());
        output.push(replaced.entry);
    }

    Ok((output, tally))
}

/// Refuse to write over the source or anywhere inside it.
fn check_overlap(source: &Path, destination: &Path) -> Result<()> {
    let Ok(source) = fs::canonicalize(source) else {
        return Ok(());
    };
    let Some(destination) = absolute_destination(destination) else {
        return Ok(());
    };

    if destination == source || destination.starts_with(&source) {
        return Err(Error::validation_invalid_argument(
            "output_folder_path",
            format!(
                "Destination {} overlaps the source {}",
                destination.display(),
                source.display()
            ),
            None,
        ));
    }
    Ok(())
}

/// Canonical form of the deepest existing ancestor plus the missing tail.
fn absolute_destination(destination: &Path) -> Option<PathBuf> {
    let mut tail = Vec::new();
    let mut cursor = destination;
    loop {
        if let Ok(base) = fs::canonicalize(cursor) {
            return Some(tail.iter().rev().fold(base, |acc: PathBuf, part| acc.join(part)));
        }
        tail.push(cursor.file_name()?.to_os_string());
        cursor = cursor.parent()?;
        if cursor.as_os_str().is_empty() {
            cursor = Path::new(".");
        }
    }
}
