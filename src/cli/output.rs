//! Output formatting for CLI

use crate::models::{BackupReport, ErrorItem, ScanResult};
use crate::services::format::{format_elapsed, format_size};
use crate::services::profiles::UserProfile;

const MAX_LISTED_ERRORS: usize = 5;

/// Print a scan summary as human-readable text
pub fn print_scan_text(result: &ScanResult) {
    let status = if result.partial { "cancelled" } else { "complete" };
    println!(
        "Scan {status}: {} match(es), {} ({})",
        result.records.len(),
        format_size(result.total_bytes()),
        format_elapsed(result.elapsed)
    );
    println!(
        "Visited {} directories and {} files",
        result.dirs_visited, result.files_visited
    );

    if !result.counts.is_empty() {
        println!();
        println!("{:<16} {:>10}", "Category", "Files");
        println!("{}", "-".repeat(27));
        for (category, count) in &result.counts {
            println!("{:<16} {:>10}", category.as_str(), count);
        }
    }

    print_errors("Errors encountered", &result.errors);
}

/// Print a backup summary as human-readable text
pub fn print_backup_text(report: &BackupReport) {
    let status = if report.partial { "cancelled" } else { "complete" };
    println!(
        "Backup {status}: {} file(s), {} copied to {} ({})",
        report.files_copied,
        format_size(report.bytes_copied),
        report.destination.display(),
        format_elapsed(report.elapsed)
    );

    print_errors("Failed copies", &report.failures);
}

pub fn print_profiles_text(profiles: &[UserProfile]) {
    if profiles.is_empty() {
        println!("No user profiles found.");
        return;
    }

    for profile in profiles {
        println!("{:<24} {}", profile.name, profile.path.display());
    }
}

fn print_errors(title: &str, errors: &[ErrorItem]) {
    if errors.is_empty() {
        return;
    }

    println!();
    println!("{title}: {}", errors.len());
    for error in errors.iter().take(MAX_LISTED_ERRORS) {
        eprintln!("  {}: {} ({})", error.path.display(), error.kind, error.message);
    }
    if errors.len() > MAX_LISTED_ERRORS {
        eprintln!("  ... and {} more", errors.len() - MAX_LISTED_ERRORS);
    }
}

/// Format a scan summary as JSON (records omitted; see the results file)
#[must_use]
pub fn format_scan_json(result: &ScanResult) -> String {
    let output = serde_json::json!({
        "roots": result.roots,
        "partial": result.partial,
        "record_count": result.records.len(),
        "total_bytes": result.total_bytes(),
        "counts": result.counts,
        "dirs_visited": result.dirs_visited,
        "files_visited": result.files_visited,
        "elapsed_ms": u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX),
        "error_count": result.errors.len(),
        "errors": result.errors,
    });

    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

/// Format a backup report as JSON
#[must_use]
pub fn format_backup_json(report: &BackupReport) -> String {
    let output = serde_json::json!({
        "destination": report.destination,
        "partial": report.partial,
        "files_copied": report.files_copied,
        "bytes_copied": report.bytes_copied,
        "elapsed_ms": u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
        "failure_count": report.failures.len(),
        "failures": report.failures,
    });

    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

#[must_use]
pub fn format_profiles_json(profiles: &[UserProfile]) -> String {
    serde_json::to_string_pretty(profiles).unwrap_or_else(|_| "[]".to_string())
}
