//! Contract test for JSON output shape

use crate::fixtures::create_docs_fixture;
use fscrape::cli::output::{format_backup_json, format_scan_json};
use fscrape::services::traverse::legacy::LegacyReader;
use fscrape::{
    BackupPlan, CancelToken, Category, PlacementMode, ProgressSender, ScanConfig, backup,
    scan_with_reader,
};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn test_scan_result_fields() {
    let temp_dir = TempDir::new().unwrap();
    let docs = create_docs_fixture(temp_dir.path()).unwrap();
    let result = scan_with_reader(
        &ScanConfig::for_roots([&docs]),
        &LegacyReader,
        &ProgressSender::disabled(),
        &CancelToken::new(),
    )
    .unwrap();

    let value: Value = serde_json::to_value(&result).unwrap();
    for field in [
        "roots",
        "records",
        "counts",
        "errors",
        "partial",
        "dirs_visited",
        "files_visited",
        "elapsed",
        "reader",
    ] {
        assert!(value.get(field).is_some(), "missing field {field}");
    }

    let record = &value["records"][0];
    assert!(record["path"].is_string());
    assert!(record["size_bytes"].is_u64());
    assert_eq!(record["category"], "text");
    assert_eq!(value["counts"]["image"], 1);
    assert_eq!(value["counts"]["video"], 1);
}

#[test]
fn test_scan_summary_json() {
    let temp_dir = TempDir::new().unwrap();
    let docs = create_docs_fixture(temp_dir.path()).unwrap();
    let result = scan_with_reader(
        &ScanConfig::for_roots([&docs]),
        &LegacyReader,
        &ProgressSender::disabled(),
        &CancelToken::new(),
    )
    .unwrap();

    let value: Value = serde_json::from_str(&format_scan_json(&result)).unwrap();

    assert_eq!(value["record_count"], 5);
    assert_eq!(value["partial"], false);
    assert_eq!(value["error_count"], 0);
    assert_eq!(value["counts"]["text"], 3);
    assert!(value["total_bytes"].is_u64());
    assert!(value["elapsed_ms"].is_u64());
}

#[test]
fn test_backup_report_json() {
    let temp_dir = TempDir::new().unwrap();
    let docs = create_docs_fixture(temp_dir.path()).unwrap();
    let result = scan_with_reader(
        &ScanConfig {
            categories: [Category::Video].into_iter().collect(),
            ..ScanConfig::for_roots([&docs])
        },
        &LegacyReader,
        &ProgressSender::disabled(),
        &CancelToken::new(),
    )
    .unwrap();

    let plan = BackupPlan::with_destination(
        result.records.clone(),
        PlacementMode::ByCategory,
        temp_dir.path().join("backup"),
    );
    let report = backup(&plan, &ProgressSender::disabled(), &CancelToken::new());
    let value: Value = serde_json::from_str(&format_backup_json(&report)).unwrap();

    assert_eq!(value["files_copied"], 1);
    assert_eq!(value["bytes_copied"], 2048);
    assert_eq!(value["failure_count"], 0);
    assert!(value["destination"].is_string());

    let full: Value = serde_json::to_value(&report).unwrap();
    assert!(full["copied"][0]["source"].is_string());
    assert!(full["copied"][0]["destination"].is_string());
    assert_eq!(full["copied"][0]["size_bytes"], 2048);
}

#[test]
fn test_error_item_fields() {
    let item = fscrape::ErrorItem {
        path: "/locked".into(),
        kind: fscrape::ErrorKind::AccessDenied,
        message: "Permission denied".to_string(),
    };

    let value: Value = serde_json::to_value(&item).unwrap();
    assert_eq!(value["path"], "/locked");
    assert_eq!(value["kind"], "AccessDenied");
    assert_eq!(value["message"], "Permission denied");
}
