use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use project_rename::replace::ReplacementRule;
use project_rename::utils::text::NEWLINE;
use project_rename::{Renamer, ReplacementOptions};
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

fn options(source: &Path, output: &Path, rules: Vec<ReplacementRule>) -> ReplacementOptions {
    ReplacementOptions {
        source_path: source.display().to_string(),
        output_folder_path: output.display().to_string(),
        rules,
        ..ReplacementOptions::default()
    }
}

fn old_to_new() -> Vec<ReplacementRule> {
    vec![ReplacementRule::new("OldCo", "NewCo")]
}

fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    for (path, bytes) in files {
        let target = root.join(path);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, bytes).unwrap();
    }
}

fn write_zip(path: &Path, records: &[(&str, &[u8])]) {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, bytes) in records {
        if name.ends_with('/') {
            writer.add_directory(name.trim_end_matches('/'), stored).unwrap();
        } else {
            writer.start_file(*name, stored).unwrap();
            writer.write_all(bytes).unwrap();
        }
    }
    fs::write(path, writer.finish().unwrap().into_inner()).unwrap();
}

fn read_zip(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes).unwrap();
            (file.name().to_string(), bytes)
        })
        .collect()
}

fn list_tree(root: &Path) -> Vec<String> {
    let mut found = Vec::new();
    for entry in walkdir::WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.unwrap();
        let relative = entry.path().strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
        found.push(if entry.file_type().is_dir() { format!("{}/", relative) } else { relative });
    }
    found
}

/// Every file and folder under `root` with its bytes, in walk order.
fn snapshot(root: &Path) -> Vec<(String, Option<Vec<u8>>)> {
    list_tree(root)
        .into_iter()
        .map(|relative| {
            let bytes = if relative.ends_with('/') { None } else { Some(fs::read(root.join(&relative)).unwrap()) };
            (relative, bytes)
        })
        .collect()
}

fn scratch() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("OldCo");
    let output = dir.path().join("out");
    (dir, source, output)
}

#[test]
fn directory_source_is_renamed_in_names_and_contents() {
    let (_dir, source, output) = scratch();
    write_tree(
        &source,
        &[
            ("readme.txt", b"Hello OldCo"),
            ("src/OldCo.Core/OldCoService.cs", b"namespace OldCo.Core;"),
        ],
    );
    fs::create_dir_all(source.join("docs/empty")).unwrap();

    let report = Renamer::new(options(&source, &output, old_to_new())).run().unwrap();

    let destination = output.join("NewCo");
    assert_eq!(report.destination, destination.display().to_string());
    assert_eq!(fs::read_to_string(destination.join("readme.txt")).unwrap(), "Hello NewCo");
    assert_eq!(
        fs::read_to_string(destination.join("src/NewCo.Core/NewCoService.cs")).unwrap(),
        "namespace NewCo.Core;"
    );
    assert!(destination.join("docs/empty").is_dir());
    assert!(source.join("readme.txt").exists());
}

#[test]
fn replace_gate_exempts_matching_entries() {
    let (_dir, source, output) = scratch();
    write_tree(&source, &[("readme.txt", b"Hello OldCo"), ("main.txt", b"OldCo")]);

    let mut opts = options(&source, &output, old_to_new());
    opts.ignore_replace_glob_rules = vec!["readme.txt".to_string()];
    Renamer::new(opts).run().unwrap();

    assert_eq!(fs::read_to_string(output.join("NewCo/readme.txt")).unwrap(), "Hello OldCo");
    assert_eq!(fs::read_to_string(output.join("NewCo/main.txt")).unwrap(), "NewCo");
}

#[test]
fn exempt_folder_keeps_its_name_under_a_renamed_parent() {
    let (_dir, source, output) = scratch();
    write_tree(&source, &[("OldCoWeb/fonts/OldCo.ttf", b"OldCo\0glyphs")]);

    let mut opts = options(&source, &output, old_to_new());
    opts.ignore_replace_glob_rules = vec!["fonts/".to_string()];
    Renamer::new(opts).run().unwrap();

    assert!(output.join("NewCo/NewCoWeb/fonts/OldCo.ttf").is_file());
}

#[test]
fn copy_gate_drops_configured_and_gitignored_paths() {
    let (_dir, source, output) = scratch();
    write_tree(
        &source,
        &[
            (".github/workflows/ci.yml", b"OldCo"),
            (".gitignore", b"bin/\n*.log\n"),
            ("bin/app.dll", b"\0"),
            ("web/.gitignore", b"!keep.log\n"),
            ("web/keep.log", b"kept"),
            ("trace.log", b"dropped"),
            ("app.txt", b"OldCo"),
        ],
    );

    let report = Renamer::new(options(&source, &output, old_to_new())).run().unwrap();

    assert_eq!(
        list_tree(&output.join("NewCo")),
        vec![".gitignore", "app.txt", "web/", "web/.gitignore", "web/keep.log"]
    );
    assert_eq!(report.skipped, 3);
}

#[test]
fn archive_source_produces_renamed_archive() {
    let (dir, _, output) = scratch();
    let source = dir.path().join("OldCo.zip");
    write_zip(
        &source,
        &[
            ("OldCo/", b""),
            ("OldCo/.gitignore", b"*.png\n"),
            ("OldCo/readme.txt", b"Hello OldCo"),
            ("OldCo/logo.png", b"\x89PNG\0OldCo"),
            ("OldCo/assets/OldCo.png", b"\x89PNG\0"),
            ("OldCo/.github/ci.yml", b"OldCo"),
        ],
    );

    let report = Renamer::new(options(&source, &output, old_to_new())).run().unwrap();

    let archive = output.join("NewCo.zip");
    assert_eq!(report.destination, archive.display().to_string());

    let records = read_zip(&archive);
    let names: Vec<&str> = records.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["NewCo/", "NewCo/.gitignore", "NewCo/readme.txt"]);
    assert_eq!(records[2].1, b"Hello NewCo");
}

#[test]
fn archive_without_top_folder_is_anchored_at_its_stem() {
    let (dir, _, output) = scratch();
    let source = dir.path().join("OldCo.zip");
    write_zip(
        &source,
        &[(".gitignore", b"dist/\n"), ("dist/out.js", b"x"), ("OldCo.txt", b"OldCo")],
    );

    Renamer::new(options(&source, &output, old_to_new())).run().unwrap();

    let records = read_zip(&output.join("NewCo.zip"));
    let names: Vec<&str> = records.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec![".gitignore", "NewCo.txt"]);
}

#[test]
fn binary_payloads_are_copied_byte_for_byte() {
    let (_dir, source, output) = scratch();
    let png: &[u8] = b"\x89PNG\r\n\x1a\n\0\0OldCo\r\n";
    write_tree(&source, &[("OldCo.png", png)]);

    let report = Renamer::new(options(&source, &output, old_to_new())).run().unwrap();

    assert_eq!(fs::read(output.join("NewCo/NewCo.png")).unwrap(), png);
    assert_eq!(report.rewritten, 0);
    assert_eq!(report.renamed, 1);
}

#[test]
fn text_line_endings_follow_the_platform() {
    let (_dir, source, output) = scratch();
    write_tree(&source, &[("a.txt", b"OldCo\r\nsecond\nthird")]);

    Renamer::new(options(&source, &output, old_to_new())).run().unwrap();

    let expected = format!("NewCo{nl}second{nl}third", nl = NEWLINE);
    assert_eq!(fs::read_to_string(output.join("NewCo/a.txt")).unwrap(), expected);
}

#[test]
fn rules_chain_in_order() {
    let (_dir, source, output) = scratch();
    write_tree(&source, &[("a.txt", b"OldCo")]);

    let rules = vec![
        ReplacementRule::new("OldCo", "MidCo"),
        ReplacementRule::new("MidCo", "NewCo"),
    ];
    Renamer::new(options(&source, &output, rules)).run().unwrap();

    assert_eq!(fs::read_to_string(output.join("NewCo/a.txt")).unwrap(), "NewCo");
}

#[test]
fn duplicate_and_empty_rules_change_nothing() {
    let (_dir, source, output) = scratch();
    write_tree(&source, &[("OldCo.txt", b"OldCo oldco")]);

    let rules = vec![
        ReplacementRule::new("", "Ghost"),
        ReplacementRule::new("OldCo", "NewCo"),
        ReplacementRule::new("OldCo", "NewCo"),
    ];
    Renamer::new(options(&source, &output, rules)).run().unwrap();

    assert_eq!(list_tree(&output.join("NewCo")), vec!["NewCo.txt"]);
    assert_eq!(fs::read_to_string(output.join("NewCo/NewCo.txt")).unwrap(), "NewCo oldco");
}

#[test]
fn case_insensitive_rule_matches_any_casing() {
    let (_dir, source, output) = scratch();
    write_tree(&source, &[("a.txt", b"OLDCO oldco OldCo")]);

    let rules = vec![ReplacementRule::new("OldCo", "NewCo").ignore_case()];
    Renamer::new(options(&source, &output, rules)).run().unwrap();

    assert_eq!(fs::read_to_string(output.join("NewCo/a.txt")).unwrap(), "NewCo NewCo NewCo");
}

#[test]
fn rerun_into_previous_destination_does_not_nest() {
    let (_dir, source, output) = scratch();
    write_tree(&source, &[("OldCo.txt", b"OldCo")]);

    Renamer::new(options(&source, &output, old_to_new())).run().unwrap();
    let first = list_tree(&output);

    let destination = output.join("NewCo");
    Renamer::new(options(&source, &destination, old_to_new())).run().unwrap();

    assert_eq!(list_tree(&output), first);
    assert_eq!(fs::read_to_string(destination.join("NewCo.txt")).unwrap(), "NewCo");
}

#[test]
fn renaming_the_output_again_is_a_no_op() {
    let (dir, source, output) = scratch();
    write_tree(
        &source,
        &[
            ("OldCo.txt", b"Hello OldCo\r\nBye OldCo\r\n"),
            ("src/OldCo/x.cs", b"class OldCo {}\n"),
            ("assets/logo.png", b"\x89PNG\0OldCo"),
            ("empty.txt", b""),
        ],
    );
    fs::create_dir_all(source.join("docs/empty")).unwrap();

    Renamer::new(options(&source, &output, old_to_new())).run().unwrap();
    let second = dir.path().join("second");
    Renamer::new(options(&output.join("NewCo"), &second, old_to_new())).run().unwrap();

    let first = snapshot(&output.join("NewCo"));
    assert_eq!(first, snapshot(&second.join("NewCo")));
    assert!(first.iter().any(|(path, _)| path == "docs/empty/"));
    let expected = format!("Hello NewCo{}Bye NewCo{}", NEWLINE, NEWLINE);
    assert_eq!(fs::read_to_string(second.join("NewCo/NewCo.txt")).unwrap(), expected);
}

#[test]
fn renaming_an_output_archive_again_is_a_no_op() {
    let (dir, _, output) = scratch();
    let source = dir.path().join("OldCo.zip");
    write_zip(
        &source,
        &[
            ("OldCo/", b""),
            ("OldCo/OldCo.txt", b"Hello OldCo\r\n"),
            ("OldCo/src/", b""),
            ("OldCo/src/logo.png", b"\x89PNG\0OldCo"),
        ],
    );

    Renamer::new(options(&source, &output, old_to_new())).run().unwrap();
    let second = dir.path().join("second");
    Renamer::new(options(&output.join("NewCo.zip"), &second, old_to_new())).run().unwrap();

    let first = read_zip(&output.join("NewCo.zip"));
    assert_eq!(first, read_zip(&second.join("NewCo.zip")));
    assert_eq!(first[0].0, "NewCo/");
    assert_eq!(first[3].1, b"\x89PNG\0OldCo");
}

#[test]
fn illegal_name_leaves_no_output() {
    let (_dir, source, output) = scratch();
    write_tree(&source, &[("readme.txt", b"x"), ("src/OldCo.cs", b"x")]);

    let rules = vec![ReplacementRule::new("OldCo", "New?Co")];
    let err = Renamer::new(options(&source, &output, rules)).run().unwrap_err();

    assert_eq!(err.code.as_str(), "rename.illegal_name");
    assert!(!output.exists());
}

#[test]
fn dot_segment_replacement_cannot_escape_the_output() {
    let (dir, _, output) = scratch();
    let source = dir.path().join("Proj");
    write_tree(&source, &[("OldCo/a.txt", b"a")]);

    let rules = vec![ReplacementRule::new("OldCo", "..")];
    let err = Renamer::new(options(&source, &output, rules)).run().unwrap_err();

    assert_eq!(err.code.as_str(), "rename.illegal_name");
    assert_eq!(err.details["segment"], "..");
    assert!(!output.exists());
    assert!(!dir.path().join("a.txt").exists());
}

#[test]
fn dot_root_name_is_rejected() {
    let (dir, source, output) = scratch();
    write_tree(&source, &[("a.txt", b"a")]);

    let rules = vec![ReplacementRule::new("OldCo", "..")];
    let err = Renamer::new(options(&source, &output, rules)).run().unwrap_err();

    assert_eq!(err.code.as_str(), "rename.illegal_name");
    assert!(!output.exists());
    assert!(!dir.path().join("a.txt").exists());
}

#[test]
fn io_failure_mid_run_leaves_no_output() {
    let (_dir, source, output) = scratch();
    write_tree(&source, &[("NewCo.txt/a.txt", b"a"), ("OldCo.txt", b"b")]);

    let err = Renamer::new(options(&source, &output, old_to_new())).run().unwrap_err();

    assert_eq!(err.code.as_str(), "internal.io_error");
    assert!(!output.exists());
}

#[test]
fn failed_write_rolls_back_and_keeps_prior_content() {
    let (_dir, source, output) = scratch();
    write_tree(&source, &[("a.txt", b"OldCo"), ("b.txt", b"OldCo"), ("c/d.txt", b"d")]);

    let destination = output.join("NewCo");
    fs::create_dir_all(destination.join("b.txt")).unwrap();
    fs::write(destination.join("notes.md"), "mine").unwrap();

    let err = Renamer::new(options(&source, &output, old_to_new())).run().unwrap_err();

    assert_eq!(err.code.as_str(), "internal.io_error");
    assert_eq!(list_tree(&destination), vec!["b.txt/", "notes.md"]);
    assert_eq!(fs::read_to_string(destination.join("notes.md")).unwrap(), "mine");
}

#[test]
fn failed_write_restores_overwritten_files() {
    let (_dir, source, output) = scratch();
    write_tree(&source, &[("a.txt", b"OldCo"), ("b.txt", b"OldCo")]);

    let destination = output.join("NewCo");
    fs::create_dir_all(destination.join("b.txt")).unwrap();
    fs::write(destination.join("a.txt"), "mine").unwrap();

    let err = Renamer::new(options(&source, &output, old_to_new())).run().unwrap_err();

    assert_eq!(err.code.as_str(), "internal.io_error");
    assert_eq!(fs::read_to_string(destination.join("a.txt")).unwrap(), "mine");
    assert_eq!(list_tree(&destination), vec!["a.txt", "b.txt/"]);
}

#[test]
fn failed_archive_write_leaves_nothing_new() {
    let (dir, _, output) = scratch();
    let source = dir.path().join("OldCo.zip");
    write_zip(&source, &[("OldCo/readme.txt", b"Hello OldCo")]);
    fs::create_dir_all(output.join("NewCo.zip")).unwrap();

    let err = Renamer::new(options(&source, &output, old_to_new())).run().unwrap_err();

    assert_eq!(err.code.as_str(), "internal.io_error");
    assert_eq!(list_tree(&output), vec!["NewCo.zip/"]);
}

#[test]
fn corrupt_archive_is_rejected_before_output() {
    let (dir, _, output) = scratch();
    let source = dir.path().join("OldCo.zip");
    write_zip(&source, &[("OldCo/readme.txt", b"Hello OldCo")]);

    let mut bytes = fs::read(&source).unwrap();
    let at = bytes.windows(11).position(|w| w == b"Hello OldCo").unwrap();
    bytes[at] = b'J';
    fs::write(&source, bytes).unwrap();

    let err = Renamer::new(options(&source, &output, old_to_new())).run().unwrap_err();

    assert_eq!(err.code.as_str(), "archive.invalid");
    assert!(!output.exists());
}

#[test]
fn missing_source_is_a_config_error() {
    let (_dir, source, output) = scratch();
    let err = Renamer::new(options(&source, &output, old_to_new())).run().unwrap_err();
    assert_eq!(err.code.as_str(), "config.invalid_value");
}
