//! Output sinks: materialize transformed entries as a directory tree or a
//! new zip archive, and undo a partial write.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::archive::{self, ArchiveRecord};
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::utils::io;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

impl CommitSummary {
    fn count(&mut self, entry: &Entry) {
        if entry.is_dir() {
            self.directories += 1;
        } else {
            self.files += 1;
            self.bytes += entry.bytes().len() as u64;
        }
    }
}

pub trait OutputSink {
    /// Directory or archive file this sink writes to.
    fn destination(&self) -> &Path;

    /// Write every entry, in order.
    fn commit(&mut self, entries: &[Entry]) -> Result<CommitSummary>;

    /// Remove whatever this sink created. Content that existed before the
    /// commit is left in place.
    fn rollback(&mut self) -> Result<()>;
}

/// Join `final_name` onto `output_root`, unless the output root already ends
/// with that name (re-running into the previous destination).
pub fn resolve_destination(output_root: &Path, final_name: &str) -> PathBuf {
    match output_root.file_name() {
        Some(last) if last == final_name => output_root.to_path_buf(),
        _ => output_root.join(final_name),
    }
}

fn remove_path(path: &Path) -> Result<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::internal_io(e.to_string(), Some(format!("roll back {}", path.display())))),
    }
}

/// Create `dir` and its missing ancestors, reporting each new directory
/// outermost first as soon as it exists.
fn create_missing_dirs(dir: &Path, mut record: impl FnMut(PathBuf)) -> Result<()> {
    let mut missing = Vec::new();
    let mut cursor = Some(dir);
    while let Some(path) = cursor {
        if path.as_os_str().is_empty() || path.is_dir() {
            break;
        }
        missing.push(path.to_path_buf());
        cursor = path.parent();
    }

    for path in missing.into_iter().rev() {
        fs::create_dir(&path)
            .map_err(|e| Error::internal_io(e.to_string(), Some(format!("create {}", path.display()))))?;
        record(path);
    }
    Ok(())
}

/// Free sibling name to park `path` under while it is being overwritten.
fn backup_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut candidate = path.with_file_name(format!(".{}.rename-backup", name));
    let mut n = 1;
    while candidate.exists() {
        candidate = path.with_file_name(format!(".{}.rename-backup.{}", name, n));
        n += 1;
    }
    candidate
}

// ============================================================================
// Directory
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Journal {
    Created(PathBuf),
    Replaced { original: PathBuf, backup: PathBuf },
}

pub struct DirectorySink {
    destination: PathBuf,
    journal: Vec<Journal>,
}

impl DirectorySink {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            journal: Vec::new(),
        }
    }

    fn ensure_dir(&mut self, dir: &Path) -> Result<()> {
        create_missing_dirs(dir, |path| self.journal.push(Journal::Created(path)))
    }

    /// Move an existing file aside so rollback can put it back.
    fn park(&mut self, target: &Path) -> Result<()> {
        let backup = backup_path_for(target);
        fs::rename(target, &backup).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("back up {}", target.display())))
        })?;
        self.journal.push(Journal::Replaced {
            original: target.to_path_buf(),
            backup,
        });
        Ok(())
    }

    /// Drop the parked originals once every entry is written.
    fn discard_backups(&mut self) {
        self.journal.retain(|step| match step {
            Journal::Created(_) => true,
            Journal::Replaced { backup, .. } => {
                if let Err(e) = fs::remove_file(backup) {
                    log_status!("write", "Could not remove backup {}: {}", backup.display(), e);
                }
                false
            }
        });
    }
}

impl OutputSink for DirectorySink {
    fn destination(&self) -> &Path {
        &self.destination
    }

    fn commit(&mut self, entries: &[Entry]) -> Result<CommitSummary> {
        let mut summary = CommitSummary::default();
        let destination = self.destination.clone();
        self.ensure_dir(&destination)?;

        for entry in entries {
            let target = destination.join(entry.trimmed_path());
            if entry.is_dir() {
                self.ensure_dir(&target)?;
            } else {
                if let Some(parent) = target.parent() {
                    self.ensure_dir(parent)?;
                }
                let existed = target.exists();
                if target.is_file() {
                    self.park(&target)?;
                }
                io::write_bytes(&target, entry.bytes(), "write output file")?;
                if !existed {
                    self.journal.push(Journal::Created(target));
                }
            }
            summary.count(entry);
            log_status!("write", "{}", entry);
        }

        self.discard_backups();
        Ok(summary)
    }

    /// Undo the journal newest first: created paths are removed and
    /// overwritten files get their original content back.
    fn rollback(&mut self) -> Result<()> {
        log_status!("rollback", "Undoing {} step(s) under {}", self.journal.len(), self.destination.display());
        while let Some(step) = self.journal.pop() {
            match step {
                Journal::Created(path) => remove_path(&path)?,
                Journal::Replaced { original, backup } => {
                    remove_path(&original)?;
                    fs::rename(&backup, &original).map_err(|e| {
                        Error::internal_io(e.to_string(), Some(format!("restore {}", original.display())))
                    })?;
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Archive
// ============================================================================

pub struct ArchiveSink {
    destination: PathBuf,
    created: bool,
    created_dirs: Vec<PathBuf>,
}

impl ArchiveSink {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            created: false,
            created_dirs: Vec::new(),
        }
    }
}

impl OutputSink for ArchiveSink {
    fn destination(&self) -> &Path {
        &self.destination
    }

    fn commit(&mut self, entries: &[Entry]) -> Result<CommitSummary> {
        let mut summary = CommitSummary::default();
        let records: Vec<ArchiveRecord> = entries
            .iter()
            .map(|entry| {
                summary.count(entry);
                if entry.is_dir() {
                    ArchiveRecord::directory(entry.path())
                } else {
                    ArchiveRecord::file(entry.path(), entry.bytes().to_vec())
                }
            })
            .collect();

        let bytes = archive::encode(&records)?;

        if let Some(parent) = self.destination.parent() {
            create_missing_dirs(parent, |path| self.created_dirs.push(path))?;
        }

        let existed = self.destination.exists();
        io::write_bytes_atomic(&self.destination, &bytes, "write output archive")?;
        self.created = !existed;

        log_status!("write", "{} record(s), {} bytes to {}", records.len(), bytes.len(), self.destination.display());
        Ok(summary)
    }

    fn rollback(&mut self) -> Result<()> {
        log_status!("rollback", "Discarding {}", self.destination.display());
        let tmp = io::temp_path_for(&self.destination, "roll back archive")?;
        remove_path(&tmp)?;
        if self.created {
            remove_path(&self.destination)?;
            self.created = false;
        }
        while let Some(dir) = self.created_dirs.pop() {
            remove_path(&dir)?;
        }
        Ok(())
    }
}
