//! Tree sources: turn a directory or a zip archive into an ordered list of
//! entries.
//!
//! Both variants register every discovered ignore file with the copy gate
//! before any entry is produced, so gate decisions do not depend on visit
//! order.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::archive;
use crate::entry::{Entry, Payload};
use crate::error::{Error, Result};
use crate::gate::{IgnoreGate, IGNORE_FILE_NAME};
use crate::utils::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Directory,
    Archive,
}

impl SourceKind {
    pub fn detect(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_invalid_value(
                    "source_path",
                    Some(path.display().to_string()),
                    "Source does not exist",
                )
            } else {
                Error::internal_io(e.to_string(), Some(format!("inspect {}", path.display())))
            }
        })?;

        if metadata.is_dir() {
            Ok(SourceKind::Directory)
        } else {
            Ok(SourceKind::Archive)
        }
    }
}

/// Contract shared by the directory walk and the archive decoder.
pub trait TreeSource {
    fn kind(&self) -> SourceKind;

    /// File or folder name of the source as it appears on disk.
    fn source_name(&self) -> &str;

    /// Canonical root used to anchor gate rules (archive extension stripped).
    fn root_name(&self) -> &str;

    /// Path under which an entry is presented to the gates.
    fn gate_path(&self, entry_path: &str) -> String;

    /// Produce every file and directory of the source in a stable order,
    /// registering discovered ignore files with `copy_gate` first.
    fn ingest(&mut self, copy_gate: &mut IgnoreGate) -> Result<Vec<Entry>>;
}

/// Open the source at `path`, picking the variant from what is on disk.
pub fn open(path: &Path) -> Result<Box<dyn TreeSource>> {
    match SourceKind::detect(path)? {
        SourceKind::Directory => Ok(Box::new(DirectorySource::new(path)?)),
        SourceKind::Archive => Ok(Box::new(ArchiveSource::new(path)?)),
    }
}

fn file_name_of(path: &Path) -> Result<String> {
    let resolved = fs::canonicalize(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("resolve {}", path.display()))))?;
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| {
            Error::config_invalid_value(
                "source_path",
                Some(path.display().to_string()),
                "Source has no file name",
            )
        })
}

// ============================================================================
// Directory
// ============================================================================

pub struct DirectorySource {
    root: PathBuf,
    name: String,
}

impl DirectorySource {
    pub fn new(root: &Path) -> Result<Self> {
        Ok(Self {
            root: root.to_path_buf(),
            name: file_name_of(root)?,
        })
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn walker(&self) -> WalkDir {
        WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
    }

    /// Register every ignore file under the root, at any depth.
    fn prescan(&self, copy_gate: &mut IgnoreGate) -> Result<usize> {
        let mut found = 0;
        for item in self.walker() {
            let item = item.map_err(|e| Error::internal_io(e.to_string(), Some("scan ignore files".to_string())))?;
            if !item.file_type().is_file() || item.file_name() != IGNORE_FILE_NAME {
                continue;
            }
            let content = io::read_file(item.path(), "read ignore file")?;
            let lines: Vec<&str> = content.lines().collect();
            copy_gate.register_ignore_file(&self.gate_path(&self.relative(item.path())), &lines)?;
            found += 1;
        }
        Ok(found)
    }
}

impl TreeSource for DirectorySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Directory
    }

    fn source_name(&self) -> &str {
        &self.name
    }

    fn root_name(&self) -> &str {
        &self.name
    }

    fn gate_path(&self, entry_path: &str) -> String {
        format!("{}/{}", self.name, entry_path)
    }

    fn ingest(&mut self, copy_gate: &mut IgnoreGate) -> Result<Vec<Entry>> {
        let ignore_files = self.prescan(copy_gate)?;
        log_status!("source", "Found {} ignore file(s) under {}", ignore_files, self.root.display());

        let mut entries = Vec::new();
        let mut walker = self.walker().into_iter();
        while let Some(item) = walker.next() {
            let item = item.map_err(|e| Error::internal_io(e.to_string(), Some("walk source".to_string())))?;
            let relative = self.relative(item.path());

            if item.file_type().is_dir() {
                let entry = Entry::directory(&relative);
                // Ignored directories are still emitted so the caller can
                // account for them, but their contents are never read.
                if copy_gate.is_ignored(&self.gate_path(entry.path()), true) {
                    walker.skip_current_dir();
                }
                entries.push(entry);
            } else {
                let bytes = io::read_bytes(item.path(), "read source file")?;
                entries.push(Entry::file(&relative, bytes));
            }
        }

        Ok(entries)
    }
}

// ============================================================================
// Archive
// ============================================================================

pub struct ArchiveSource {
    path: PathBuf,
    name: String,
    stem: String,
    /// Every record sits under `<stem>/`. Decided once per archive.
    nested: bool,
}

impl ArchiveSource {
    pub fn new(path: &Path) -> Result<Self> {
        let name = file_name_of(path)?;
        let stem = Path::new(&name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| name.clone());
        Ok(Self {
            path: path.to_path_buf(),
            name,
            stem,
            nested: false,
        })
    }
}

impl TreeSource for ArchiveSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Archive
    }

    fn source_name(&self) -> &str {
        &self.name
    }

    fn root_name(&self) -> &str {
        &self.stem
    }

    /// Archives may or may not carry a top-level folder named after the
    /// archive; both layouts map onto the same gate path.
    fn gate_path(&self, entry_path: &str) -> String {
        if self.nested {
            entry_path.to_string()
        } else {
            format!("{}/{}", self.stem, entry_path)
        }
    }

    fn ingest(&mut self, copy_gate: &mut IgnoreGate) -> Result<Vec<Entry>> {
        let bytes = io::read_bytes(&self.path, "read source archive")?;
        let entries: Vec<Entry> = archive::decode(&bytes)?
            .into_iter()
            .map(|record| {
                if record.is_dir {
                    Entry::directory(&record.name)
                } else {
                    Entry::file(&record.name, record.bytes)
                }
            })
            .collect();

        let prefix = format!("{}/", self.stem);
        self.nested = !entries.is_empty() && entries.iter().all(|e| e.path().starts_with(&prefix));

        let mut ignore_files = 0;
        for entry in entries.iter().filter(|e| !e.is_dir() && e.name() == IGNORE_FILE_NAME) {
            match entry.classify() {
                Payload::Text(text) => {
                    let lines: Vec<&str> = text.lines().collect();
                    copy_gate.register_ignore_file(&self.gate_path(entry.path()), &lines)?;
                    ignore_files += 1;
                }
                Payload::Binary | Payload::Directory => {
                    log_status!("source", "Skipping unreadable ignore file {}", entry.path());
                }
            }
        }

        log_status!(
            "source",
            "Decoded {} record(s) and {} ignore file(s) from {}",
            entries.len(),
            ignore_files,
            self.path.display()
        );

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{encode, ArchiveRecord};
    use tempfile::TempDir;

    fn paths(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.path()).collect()
    }

    #[test]
    fn detect_distinguishes_directories_and_files() {
        let dir = TempDir::new().unwrap();
        let zip = dir.path().join("OldCo.zip");
        fs::write(&zip, encode(&[]).unwrap()).unwrap();

        assert_eq!(SourceKind::detect(dir.path()).unwrap(), SourceKind::Directory);
        assert_eq!(SourceKind::detect(&zip).unwrap(), SourceKind::Archive);

        let err = SourceKind::detect(&dir.path().join("missing")).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }

    #[test]
    fn directory_walk_is_sorted_parent_first() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("OldCo");
        fs::create_dir_all(root.join("src/empty")).unwrap();
        fs::write(root.join("src/b.txt"), "b").unwrap();
        fs::write(root.join("a.txt"), "").unwrap();

        let mut source = DirectorySource::new(&root).unwrap();
        let entries = source.ingest(&mut IgnoreGate::new("copy")).unwrap();

        assert_eq!(source.root_name(), "OldCo");
        assert_eq!(paths(&entries), vec!["a.txt", "src/", "src/b.txt", "src/empty/"]);
        assert!(entries[0].bytes().is_empty());
        assert!(entries[3].is_dir());
    }

    #[test]
    fn directory_prescan_registers_deep_ignore_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("OldCo");
        fs::create_dir_all(root.join("a")).unwrap();
        fs::create_dir_all(root.join("z/dist")).unwrap();
        fs::write(root.join("z/.gitignore"), "dist/\n").unwrap();
        fs::write(root.join("z/dist/out.js"), "x").unwrap();

        let mut source = DirectorySource::new(&root).unwrap();
        let mut gate = IgnoreGate::new("copy");
        let entries = source.ingest(&mut gate).unwrap();

        assert!(gate.is_ignored("OldCo/z/dist", true));
        assert!(paths(&entries).contains(&"z/dist/"));
        assert!(!paths(&entries).contains(&"z/dist/out.js"));
    }

    #[test]
    fn archive_records_keep_stored_order() {
        let dir = TempDir::new().unwrap();
        let zip = dir.path().join("OldCo.zip");
        let records = vec![
            ArchiveRecord::file("OldCo/z.txt", b"z".to_vec()),
            ArchiveRecord::directory("OldCo/"),
            ArchiveRecord::file("OldCo/a.txt", b"a".to_vec()),
        ];
        fs::write(&zip, encode(&records).unwrap()).unwrap();

        let mut source = ArchiveSource::new(&zip).unwrap();
        let entries = source.ingest(&mut IgnoreGate::new("copy")).unwrap();

        assert_eq!(source.source_name(), "OldCo.zip");
        assert_eq!(source.root_name(), "OldCo");
        assert_eq!(paths(&entries), vec!["OldCo/z.txt", "OldCo/", "OldCo/a.txt"]);
    }

    #[test]
    fn archive_ignore_files_are_registered_before_filtering() {
        let dir = TempDir::new().unwrap();
        let zip = dir.path().join("OldCo.zip");
        let records = vec![
            ArchiveRecord::file("logo.png", vec![0x89, 0x00]),
            ArchiveRecord::file(".gitignore", b"*.png\r\n".to_vec()),
        ];
        fs::write(&zip, encode(&records).unwrap()).unwrap();

        let mut source = ArchiveSource::new(&zip).unwrap();
        let mut gate = IgnoreGate::new("copy");
        source.ingest(&mut gate).unwrap();

        assert!(gate.is_ignored(&source.gate_path("logo.png"), false));
        assert!(!gate.is_ignored(&source.gate_path(".gitignore"), false));
    }

    #[test]
    fn archive_gate_path_handles_both_layouts() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("OldCo.zip");
        fs::write(&nested, encode(&[ArchiveRecord::file("OldCo/src/a.cs", vec![])]).unwrap()).unwrap();
        let mut source = ArchiveSource::new(&nested).unwrap();
        source.ingest(&mut IgnoreGate::new("copy")).unwrap();
        assert_eq!(source.gate_path("OldCo/src/a.cs"), "OldCo/src/a.cs");

        let flat = dir.path().join("flat").join("OldCo.zip");
        fs::create_dir_all(flat.parent().unwrap()).unwrap();
        fs::write(&flat, encode(&[ArchiveRecord::file("src/a.cs", vec![])]).unwrap()).unwrap();
        let mut source = ArchiveSource::new(&flat).unwrap();
        source.ingest(&mut IgnoreGate::new("copy")).unwrap();
        assert_eq!(source.gate_path("src/a.cs"), "OldCo/src/a.cs");
    }

    #[test]
    fn archive_layout_is_decided_for_the_whole_archive() {
        let dir = TempDir::new().unwrap();
        let zip = dir.path().join("OldCo.zip");
        let records = vec![
            ArchiveRecord::file("OldCo/x.txt", b"x".to_vec()),
            ArchiveRecord::file("tests/y.txt", b"y".to_vec()),
        ];
        fs::write(&zip, encode(&records).unwrap()).unwrap();

        let mut source = ArchiveSource::new(&zip).unwrap();
        source.ingest(&mut IgnoreGate::new("copy")).unwrap();

        assert_eq!(source.gate_path("OldCo/x.txt"), "OldCo/OldCo/x.txt");
        assert_eq!(source.gate_path("tests/y.txt"), "OldCo/tests/y.txt");
    }

    #[test]
    fn corrupt_archive_fails_before_any_entry() {
        let dir = TempDir::new().unwrap();
        let zip = dir.path().join("OldCo.zip");
        fs::write(&zip, b"PK\x03\x04 broken").unwrap();

        let mut source = ArchiveSource::new(&zip).unwrap();
        let err = source.ingest(&mut IgnoreGate::new("copy")).unwrap_err();
        assert_eq!(err.code.as_str(), "archive.invalid");
    }
}
