//! Backup engine: copies scan records into a timestamped destination root.
//!
//! Every file is written through [`copy::copy_atomically`], name collisions
//! get a numeric suffix instead of overwriting, and a failing file is
//! recorded in the report while the run moves on to the next one.

pub mod copy;
pub mod naming;

use crate::models::{BackupReport, Category, CopiedFile, ErrorItem, ErrorKind, FileRecord, ScanResult};
use crate::services::cancel::CancelToken;
use crate::services::progress::{Outcome, ProgressEvent, ProgressReporter, ProgressSender};
use crate::Result;
use copy::{CopyOutcome, copy_atomically};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Layout of files below the destination root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementMode {
    /// `<root>/<category>/<file name>`
    #[default]
    ByCategory,
    /// `<root>/<original path without drive or root>`
    PreserveStructure,
}

impl PlacementMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementMode::ByCategory => "by-category",
            PlacementMode::PreserveStructure => "preserve-structure",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "by-category" | "category" | "categories" => Some(PlacementMode::ByCategory),
            "preserve-structure" | "preserve" | "mirror" => Some(PlacementMode::PreserveStructure),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlacementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlacementMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PlacementMode::from_label(s).ok_or_else(|| format!("unknown placement mode '{s}'"))
    }
}

/// Records to copy, their layout, and the destination root of the run.
#[derive(Debug, Clone)]
pub struct BackupPlan {
    records: Vec<FileRecord>,
    mode: PlacementMode,
    destination: PathBuf,
    progress_interval: Duration,
    progress_entry_trigger: u64,
}

impl BackupPlan {
    /// Plan a run into a freshly created `<backup_base>/<YYYYMMDD-HHMMSS>/`
    /// (local time), suffixed `-N` when that folder is already taken.
    pub fn new(records: Vec<FileRecord>, mode: PlacementMode, backup_base: &Path) -> Result<Self> {
        let destination = naming::claim_timestamped_root(backup_base, &chrono::Local::now())?;
        log::debug!("Claimed backup folder {}", destination.display());
        Ok(Self::with_destination(records, mode, destination))
    }

    /// Plan a run into an explicit destination root.
    #[must_use]
    pub fn with_destination(
        records: Vec<FileRecord>,
        mode: PlacementMode,
        destination: PathBuf,
    ) -> Self {
        Self {
            records,
            mode,
            destination,
            progress_interval: Duration::from_millis(500),
            progress_entry_trigger: 50,
        }
    }

    /// Plan the records of `result` belonging to `categories` (all when empty).
    pub fn from_scan(
        result: &ScanResult,
        categories: &[Category],
        mode: PlacementMode,
        backup_base: &Path,
    ) -> Result<Self> {
        let records = result.records_in(categories).cloned().collect();
        Self::new(records, mode, backup_base)
    }

    #[must_use]
    pub fn with_progress(mut self, interval: Duration, entry_trigger: u64) -> Self {
        self.progress_interval = interval;
        self.progress_entry_trigger = entry_trigger;
        self
    }

    #[must_use]
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    #[must_use]
    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }
}

/// Copy every record of `plan`, then send one terminal event.
pub fn backup(plan: &BackupPlan, progress: &ProgressSender, cancel: &CancelToken) -> BackupReport {
    let report = run_backup(plan, progress, cancel);
    let outcome = Outcome::Backup(Arc::new(report.clone()));
    let event = if report.partial {
        ProgressEvent::Cancelled(outcome)
    } else {
        ProgressEvent::Done(outcome)
    };
    progress.send(event);
    report
}

/// Perform the copies without sending a terminal event.
pub(crate) fn run_backup(
    plan: &BackupPlan,
    progress: &ProgressSender,
    cancel: &CancelToken,
) -> BackupReport {
    run_backup_with(plan, progress, cancel, |_| {})
}

/// [`run_backup`] with a callback after every completed copy.
fn run_backup_with<F>(
    plan: &BackupPlan,
    progress: &ProgressSender,
    cancel: &CancelToken,
    mut after_copy: F,
) -> BackupReport
where
    F: FnMut(&CopiedFile),
{
    let mut reporter = ProgressReporter::new(
        progress.clone(),
        plan.progress_interval,
        plan.progress_entry_trigger,
    );

    log::info!(
        "Backing up {} file(s) to {} ({})",
        plan.records.len(),
        plan.destination.display(),
        plan.mode
    );

    let mut copied = Vec::new();
    let mut failures = Vec::new();
    let mut bytes_copied = 0u64;
    let mut processed = 0u64;
    let mut partial = false;

    for record in &plan.records {
        if cancel.is_cancelled() {
            partial = true;
            break;
        }

        match copy_record(record, plan, cancel) {
            Ok(Some(file)) => {
                bytes_copied += file.size_bytes;
                log::debug!("Copied {} -> {}", file.source.display(), file.destination.display());
                after_copy(&file);
                copied.push(file);
            }
            Ok(None) => {
                partial = true;
                break;
            }
            Err(message) => {
                log::warn!("Backup of {} failed: {message}", record.path.display());
                reporter.error(record.path.clone(), ErrorKind::CopyFailed);
                failures.push(ErrorItem {
                    path: record.path.clone(),
                    kind: ErrorKind::CopyFailed,
                    message,
                });
            }
        }

        processed += 1;
        let files = copied.len() as u64;
        reporter.tick(processed, || {
            vec![
                ProgressEvent::Visiting(record.path.clone()),
                ProgressEvent::Transferred {
                    files,
                    bytes: bytes_copied,
                },
            ]
        });
    }

    let report = BackupReport {
        destination: plan.destination.clone(),
        files_copied: copied.len() as u64,
        bytes_copied,
        copied,
        failures,
        partial,
        elapsed: reporter.elapsed(),
    };

    log::info!(
        "Backup {}: {} file(s), {} byte(s), {} failure(s), {:?}",
        if report.partial { "cancelled" } else { "complete" },
        report.files_copied,
        report.bytes_copied,
        report.failures.len(),
        report.elapsed
    );

    report
}

/// Copy one record. `Ok(None)` means the copy was cancelled midway.
fn copy_record(
    record: &FileRecord,
    plan: &BackupPlan,
    cancel: &CancelToken,
) -> std::result::Result<Option<CopiedFile>, String> {
    let target = naming::destination_for(record, plan.mode, &plan.destination)
        .ok_or_else(|| "source path has no file name".to_string())?;
    let target = naming::resolve_collision(target);

    match copy_atomically(&record.path, &target, cancel) {
        Ok(CopyOutcome::Copied { destination, bytes }) => Ok(Some(CopiedFile {
            source: record.path.clone(),
            destination,
            size_bytes: bytes,
        })),
        Ok(CopyOutcome::Cancelled) => Ok(None),
        Err(err) => Err(describe_copy_error(&err)),
    }
}

fn describe_copy_error(err: &std::io::Error) -> String {
    match err.kind() {
        std::io::ErrorKind::NotFound => format!("source or destination missing: {err}"),
        std::io::ErrorKind::PermissionDenied => format!("permission denied: {err}"),
        _ => err.to_string(),
    }
}
