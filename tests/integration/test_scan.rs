//! Integration tests for traversal

use crate::fixtures::{CountingReader, create_docs_fixture, write_file_sync};
use fscrape::services::traverse::legacy::LegacyReader;
use fscrape::{
    CancelToken, Category, ErrorKind, ProgressEvent, ProgressSender, ScanConfig, ScanResult,
    scan_with_reader,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn config(root: &Path, categories: &[Category]) -> ScanConfig {
    ScanConfig {
        categories: categories.iter().cloned().collect::<BTreeSet<_>>(),
        ..ScanConfig::for_roots([root])
    }
}

fn run(config: &ScanConfig) -> ScanResult {
    scan_with_reader(
        config,
        &LegacyReader,
        &ProgressSender::disabled(),
        &CancelToken::new(),
    )
    .unwrap()
}

fn record_paths(result: &ScanResult) -> Vec<PathBuf> {
    result.records.iter().map(|r| r.path.clone()).collect()
}

#[test]
fn blocked_folder_is_walked_but_hidden() {
    let temp_dir = TempDir::new().unwrap();
    let docs = create_docs_fixture(temp_dir.path()).unwrap();

    let mut config = config(&docs, &[Category::Text]);
    config.block.push(docs.join("archive"));

    let reader = CountingReader::new();
    let result = scan_with_reader(
        &config,
        &reader,
        &ProgressSender::disabled(),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(
        record_paths(&result),
        vec![docs.join("a.txt"), docs.join("notes/c.TXT")]
    );
    assert_eq!(reader.reads_of(&docs.join("archive")), 1);
    assert!(result.errors.is_empty());
    assert!(!result.partial);
    // img.png and clip.mp4 are excluded by category, b.txt by the block
    assert_eq!(result.files_visited, 5);
    assert_eq!(result.counts.get(&Category::Text), Some(&2));
}

#[test]
fn skipped_folder_is_never_read() {
    let temp_dir = TempDir::new().unwrap();
    let docs = create_docs_fixture(temp_dir.path()).unwrap();

    let mut config = config(&docs, &Category::BUILTIN);
    config.skip.push(docs.join("notes"));

    let reader = CountingReader::new();
    let result = scan_with_reader(
        &config,
        &reader,
        &ProgressSender::disabled(),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(reader.reads_of(&docs.join("notes")), 0);
    assert_eq!(reader.reads_of(&docs), 1);
    assert!(
        result
            .records
            .iter()
            .all(|r| !r.path.starts_with(docs.join("notes")))
    );
    assert_eq!(result.records.len(), 3);
}

#[test]
fn skip_wins_over_block_for_the_same_folder() {
    let temp_dir = TempDir::new().unwrap();
    let docs = create_docs_fixture(temp_dir.path()).unwrap();

    let mut config = config(&docs, &[Category::Text]);
    config.skip.push(docs.join("archive"));
    config.block.push(docs.join("archive"));

    let reader = CountingReader::new();
    let _ = scan_with_reader(
        &config,
        &reader,
        &ProgressSender::disabled(),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(reader.reads_of(&docs.join("archive")), 0);
}

#[test]
fn skip_pattern_matches_folder_name_case_insensitively() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("profile");
    write_file_sync(root.join("keep.txt"), b"keep").unwrap();
    write_file_sync(root.join("appdata/Local/cache.txt"), b"cache").unwrap();

    let mut config = config(&root, &[Category::Text]);
    config.skip_patterns.push("AppData".to_string());

    let result = run(&config);

    assert_eq!(record_paths(&result), vec![root.join("keep.txt")]);
}

#[test]
fn root_inside_a_skipped_folder_name_is_still_scanned() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("AppData/Roaming/Keep");
    write_file_sync(root.join("notes.txt"), b"keep").unwrap();
    write_file_sync(root.join("sub/AppData/cache.txt"), b"cache").unwrap();

    let mut config = config(&root, &[Category::Text]);
    config.skip_patterns.push("AppData".to_string());

    let result = run(&config);

    assert_eq!(record_paths(&result), vec![root.join("notes.txt")]);
    assert!(result.errors.is_empty());
}

#[test]
fn category_filter_selects_requested_buckets() {
    let temp_dir = TempDir::new().unwrap();
    let docs = create_docs_fixture(temp_dir.path()).unwrap();

    let result = run(&config(&docs, &[Category::Image, Category::Video]));

    assert_eq!(
        record_paths(&result),
        vec![docs.join("img.png"), docs.join("notes/clip.mp4")]
    );
    assert_eq!(result.records[1].size_bytes, 2048);
    assert_eq!(result.records[1].category, Category::Video);
    assert!(result.records[0].modified.is_some());
}

#[test]
fn identical_trees_produce_identical_order() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("tree");
    // Create in reverse so creation order differs from name order
    for name in ["z", "m", "b", "a"] {
        write_file_sync(root.join(name).join(format!("{name}.txt")), name.as_bytes()).unwrap();
        write_file_sync(root.join(format!("{name}.txt")), name.as_bytes()).unwrap();
    }

    let config = config(&root, &[Category::Text]);
    let first = record_paths(&run(&config));
    let second = record_paths(&run(&config));

    assert_eq!(first, second);
    assert_eq!(first.len(), 8);
    // Name order puts the a/ subtree before a.txt
    assert_eq!(first[0], root.join("a/a.txt"));
    assert_eq!(first[1], root.join("a.txt"));
}

#[test]
fn roots_are_scanned_in_configured_order() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("zeta");
    let second = temp_dir.path().join("alpha");
    write_file_sync(first.join("one.txt"), b"1").unwrap();
    write_file_sync(second.join("two.txt"), b"2").unwrap();

    let config = ScanConfig {
        categories: [Category::Text].into_iter().collect(),
        ..ScanConfig::for_roots([first.clone(), second.clone()])
    };
    let result = run(&config);

    assert_eq!(
        record_paths(&result),
        vec![first.join("one.txt"), second.join("two.txt")]
    );
    assert_eq!(result.roots, vec![first, second]);
}

#[test]
fn duplicate_roots_are_scanned_once() {
    let temp_dir = TempDir::new().unwrap();
    let docs = create_docs_fixture(temp_dir.path()).unwrap();

    let config = ScanConfig {
        categories: [Category::Text].into_iter().collect(),
        ..ScanConfig::for_roots([docs.clone(), docs.join("notes/..")])
    };
    let result = run(&config);

    assert_eq!(result.roots.len(), 1);
    assert_eq!(result.records.len(), 3);
}

#[test]
fn missing_root_among_valid_roots_is_recorded() {
    let temp_dir = TempDir::new().unwrap();
    let docs = create_docs_fixture(temp_dir.path()).unwrap();
    let missing = temp_dir.path().join("gone");

    let config = ScanConfig {
        categories: [Category::Text].into_iter().collect(),
        ..ScanConfig::for_roots([missing.clone(), docs])
    };
    let result = run(&config);

    assert_eq!(result.records.len(), 3);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, missing);
    assert_eq!(result.errors[0].kind, ErrorKind::PathNotFound);
}

#[test]
fn pre_cancelled_scan_is_partial_and_empty() {
    let temp_dir = TempDir::new().unwrap();
    let docs = create_docs_fixture(temp_dir.path()).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();

    let (sender, receiver) = fscrape::services::progress::channel(16);
    let result = scan_with_reader(&config(&docs, &Category::BUILTIN), &LegacyReader, &sender, &cancel)
        .unwrap();
    drop(sender);

    assert!(result.partial);
    assert!(result.records.is_empty());
    let events: Vec<ProgressEvent> = receiver.iter().collect();
    assert!(matches!(events.last(), Some(ProgressEvent::Cancelled(_))));
}

#[test]
fn custom_category_collects_its_extensions() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("music");
    write_file_sync(root.join("song.MP3"), b"id3").unwrap();
    write_file_sync(root.join("lyrics.txt"), b"la la").unwrap();

    let mut config = config(&root, &[Category::Custom("audio".to_string())]);
    config
        .custom_categories
        .insert("audio".to_string(), vec!["*.mp3".to_string(), ".flac".to_string()]);

    let result = run(&config);

    assert_eq!(record_paths(&result), vec![root.join("song.MP3")]);
    assert_eq!(result.records[0].category, Category::Custom("audio".into()));
}

#[test]
fn progress_counts_arrive_before_terminal_event() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("many");
    for i in 0..20 {
        write_file_sync(root.join(format!("d{i:02}/f.txt")), b"x").unwrap();
    }

    let mut config = config(&root, &[Category::Text]);
    config.progress_entry_trigger = 5;

    let (sender, receiver) = fscrape::services::progress::channel(1024);
    let result = scan_with_reader(&config, &LegacyReader, &sender, &CancelToken::new()).unwrap();
    drop(sender);

    let events: Vec<ProgressEvent> = receiver.iter().collect();
    assert!(events.iter().any(|e| matches!(e, ProgressEvent::Counts(_))));
    assert!(events.iter().any(|e| matches!(e, ProgressEvent::Visiting(_))));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    let Some(ProgressEvent::Done(outcome)) = events.last() else {
        panic!("expected Done as the last event");
    };
    assert_eq!(outcome.as_scan().unwrap().records.len(), result.records.len());
}

#[cfg(unix)]
#[test]
fn symlink_cycle_is_pruned() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("loop");
    write_file_sync(root.join("inner/file.txt"), b"once").unwrap();
    std::os::unix::fs::symlink(&root, root.join("inner/back")).unwrap();

    let result = run(&config(&root, &[Category::Text]));

    assert_eq!(record_paths(&result), vec![root.join("inner/file.txt")]);
    assert!(result.errors.is_empty());
}

#[cfg(unix)]
#[test]
fn broken_symlink_is_recorded_and_scan_continues() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("links");
    write_file_sync(root.join("real.txt"), b"real").unwrap();
    std::os::unix::fs::symlink(root.join("nowhere"), root.join("dangling")).unwrap();

    let result = run(&config(&root, &[Category::Text]));

    assert_eq!(record_paths(&result), vec![root.join("real.txt")]);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ErrorKind::PathNotFound);
}

#[cfg(unix)]
#[test]
fn unreadable_folder_is_recorded_and_pruned() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    if !crate::fixtures::permissions_enforced(temp_dir.path()) {
        eprintln!("Skipping: permission checks are not enforced for this user");
        return;
    }

    let docs = create_docs_fixture(temp_dir.path()).unwrap();
    let locked = docs.join("archive");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let result = run(&config(&docs, &[Category::Text]));

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(
        record_paths(&result),
        vec![docs.join("a.txt"), docs.join("notes/c.TXT")]
    );
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, locked);
    assert_eq!(result.errors[0].kind, ErrorKind::AccessDenied);
    assert!(!result.partial);
}

#[cfg(unix)]
#[test]
fn posix_and_legacy_readers_agree() {
    use fscrape::services::traverse::posix::PosixReader;

    let temp_dir = TempDir::new().unwrap();
    let docs = create_docs_fixture(temp_dir.path()).unwrap();
    let config = config(&docs, &Category::BUILTIN);

    let legacy = run(&config);
    let posix = scan_with_reader(
        &config,
        &PosixReader,
        &ProgressSender::disabled(),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(posix.records, legacy.records);
    assert_eq!(posix.dirs_visited, legacy.dirs_visited);
    assert_eq!(posix.reader, "posix");
    assert_eq!(legacy.reader, "legacy");
}
