//! Zip codec: archive bytes to ordered records and back.

use std::io::{Cursor, Read, Write};
use std::path::{Component, Path};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

/// Deflate level used for every written record.
pub const COMPRESSION_LEVEL: i32 = 3;

/// One record of an archive, in stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub name: String,
    pub bytes: Vec<u8>,
    pub is_dir: bool,
}

impl ArchiveRecord {
    pub fn file(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            is_dir: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes: Vec::new(),
            is_dir: true,
        }
    }
}

/// Decode a whole archive into memory.
///
/// Reading every record to the end makes the zip reader verify each CRC, so a
/// corrupt archive fails here before any record reaches the pipeline.
pub fn decode(bytes: &[u8]) -> Result<Vec<ArchiveRecord>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::archive_invalid(e.to_string(), None))?;

    let mut records = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| Error::archive_invalid(e.to_string(), None))?;

        let raw_name = file.name().to_string();
        let name = sanitize_record_name(&raw_name)?;
        let is_dir = file.is_dir();

        let mut contents = Vec::new();
        if !is_dir {
            file.read_to_end(&mut contents)
                .map_err(|e| Error::archive_invalid(e.to_string(), Some(raw_name.clone())))?;
        }

        records.push(ArchiveRecord {
            name,
            bytes: contents,
            is_dir,
        });
    }

    Ok(records)
}

/// Encode records into a new archive, preserving their order.
pub fn encode(records: &[ArchiveRecord]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    for record in records {
        let context = || Some(format!("write archive record {}", record.name));
        if record.is_dir {
            writer
                .add_directory(record.name.trim_end_matches('/'), options)
                .map_err(|e| Error::internal_io(e.to_string(), context()))?;
        } else {
            writer
                .start_file(record.name.as_str(), options)
                .map_err(|e| Error::internal_io(e.to_string(), context()))?;
            writer
                .write_all(&record.bytes)
                .map_err(|e| Error::internal_io(e.to_string(), context()))?;
        }
    }

    let cursor = writer
        .finish()
        .map_err(|e| Error::internal_io(e.to_string(), Some("finish archive".to_string())))?;
    Ok(cursor.into_inner())
}

/// Normalize a stored record name and reject names that escape the archive
/// root (absolute paths, drive prefixes, `..`).
pub fn sanitize_record_name(raw_name: &str) -> Result<String> {
    let unified = raw_name.replace('\\', "/");
    let is_dir = unified.ends_with('/');
    let relative = unified.trim_start_matches('/');

    let mut components = Vec::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| {
                    Error::archive_invalid("Record name is not valid UTF-8", Some(raw_name.to_string()))
                })?;
                components.push(part);
            }
            Component::CurDir => continue,
            Component::ParentDir => {
                return Err(Error::archive_invalid(
                    "Parent directory traversal not allowed",
                    Some(raw_name.to_string()),
                ));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(Error::archive_invalid(
                    "Absolute record name not allowed",
                    Some(raw_name.to_string()),
                ));
            }
        }
    }

    if components.is_empty() {
        return Err(Error::archive_invalid(
            "Record name has no path components",
            Some(raw_name.to_string()),
        ));
    }

    let mut name = components.join("/");
    if is_dir {
        name.push('/');
    }
    Ok(name)
}
