//! Traversal dispatcher and scan entry points.
//!
//! A scan walks every configured root depth-first through a
//! [`DirectoryReader`], asking the filter engine at each directory whether it
//! is skipped (never read) or blocked (read, files hidden) and at each file
//! which category it belongs to. Invariants shared by every backend:
//!
//! - Children are visited in name order, so identical trees produce
//!   identical record sequences.
//! - Per-directory and per-file failures are recorded, never propagated.
//! - Cancellation is observed before each directory and yields a partial
//!   result.

pub mod legacy;
pub mod posix;
pub mod reader;
mod walk;

pub use reader::{DirChild, DirectoryReader, EntryKind, Listing};

use crate::models::ScanResult;
use crate::services::cancel::CancelToken;
use crate::services::filter::{FilterEngine, absolutize};
use crate::services::progress::{Outcome, ProgressEvent, ProgressReporter, ProgressSender};
use crate::{Error, Result, ScanConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use walk::TraversalContext;

/// Enumeration of available directory listing backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderKind {
    /// Portable backend built on `std::fs::read_dir`.
    #[default]
    Legacy,
    /// POSIX backend built on `openat`/`getdents`.
    Posix,
}

impl ReaderKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReaderKind::Legacy => "legacy",
            ReaderKind::Posix => "posix",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "legacy" | "std" => Some(ReaderKind::Legacy),
            "posix" | "unix" => Some(ReaderKind::Posix),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReaderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ReaderKind::from_label(s).ok_or_else(|| format!("unknown reader '{s}'"))
    }
}

/// Selects the listing backend for a scan.
#[derive(Debug)]
pub struct TraversalDispatcher {
    kind: ReaderKind,
    explicit_override: bool,
}

impl TraversalDispatcher {
    /// Use the configured override, or the best backend for this platform.
    #[must_use]
    pub fn for_config(config: &ScanConfig) -> Self {
        match config.reader_override {
            Some(kind) => Self {
                kind,
                explicit_override: true,
            },
            None => Self {
                kind: default_reader(),
                explicit_override: false,
            },
        }
    }

    #[must_use]
    pub fn active_reader(&self) -> ReaderKind {
        Self::ensure_supported(self.kind)
    }

    /// Instantiate the selected backend.
    #[must_use]
    pub fn reader(&self) -> Box<dyn DirectoryReader> {
        let resolved = self.active_reader();
        if self.explicit_override && resolved != self.kind {
            log::warn!(
                "Requested reader '{}' unsupported; falling back to '{}'",
                self.kind,
                resolved,
            );
        }

        match resolved {
            ReaderKind::Legacy => Box::new(legacy::LegacyReader),
            ReaderKind::Posix => Box::new(posix::PosixReader),
        }
    }

    fn ensure_supported(kind: ReaderKind) -> ReaderKind {
        match kind {
            ReaderKind::Posix if posix::PosixReader::is_supported() => ReaderKind::Posix,
            _ => ReaderKind::Legacy,
        }
    }
}

/// Return the default reader for the current host.
#[must_use]
pub fn default_reader() -> ReaderKind {
    if posix::PosixReader::is_supported() {
        ReaderKind::Posix
    } else {
        ReaderKind::Legacy
    }
}

/// Scan the configured roots with the platform's preferred reader.
///
/// Emits throttled progress on `progress`, then exactly one terminal event
/// (`Done`, `Cancelled`, or `Failed`). Only configuration problems produce an
/// `Err`; unreadable paths end up in [`ScanResult::errors`].
pub fn scan(
    config: &ScanConfig,
    progress: &ProgressSender,
    cancel: &CancelToken,
) -> Result<ScanResult> {
    let reader = TraversalDispatcher::for_config(config).reader();
    scan_with_reader(config, reader.as_ref(), progress, cancel)
}

/// Scan with an explicit reader backend.
pub fn scan_with_reader(
    config: &ScanConfig,
    reader: &dyn DirectoryReader,
    progress: &ProgressSender,
    cancel: &CancelToken,
) -> Result<ScanResult> {
    match run_scan(config, reader, progress, cancel) {
        Ok(result) => {
            let shared = Arc::new(result.clone());
            progress.send(terminal_event(&result, Outcome::Scan(shared)));
            Ok(result)
        }
        Err(err) => {
            progress.send(ProgressEvent::Failed(err.to_string()));
            Err(err)
        }
    }
}

/// Terminal event matching how a run ended.
pub(crate) fn terminal_event(result: &ScanResult, outcome: Outcome) -> ProgressEvent {
    if result.partial {
        ProgressEvent::Cancelled(outcome)
    } else {
        ProgressEvent::Done(outcome)
    }
}

/// Perform the traversal without sending a terminal event.
pub(crate) fn run_scan(
    config: &ScanConfig,
    reader: &dyn DirectoryReader,
    progress: &ProgressSender,
    cancel: &CancelToken,
) -> Result<ScanResult> {
    config.validate()?;
    let filter = FilterEngine::new(config)?;
    let roots = resolve_roots(&config.roots)?;

    if !roots.iter().any(|root| root.is_dir()) {
        return Err(Error::InvalidConfig(
            "none of the root directories exist".to_string(),
        ));
    }

    log::info!(
        "Scanning {} root(s) with the {} reader for {} categor(ies)",
        roots.len(),
        reader.kind(),
        filter.requested().len()
    );

    let reporter = ProgressReporter::new(
        progress.clone(),
        config.progress_interval,
        config.progress_entry_trigger,
    );
    let mut context = TraversalContext::new(&filter, reader, cancel, reporter);

    for root in &roots {
        context.walk_root(root);
        if context.is_partial() {
            break;
        }
    }

    let result = context.into_result(roots);

    log::info!(
        "Scan {}: {} match(es) in {} file(s) and {} dir(s), {} error(s), {:?}",
        if result.partial { "cancelled" } else { "complete" },
        result.records.len(),
        result.files_visited,
        result.dirs_visited,
        result.errors.len(),
        result.elapsed
    );

    Ok(result)
}

fn resolve_roots(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut resolved: Vec<PathBuf> = Vec::with_capacity(roots.len());
    for root in roots {
        let absolute = absolutize(root)?;
        if !resolved.contains(&absolute) {
            resolved.push(absolute);
        }
    }
    Ok(resolved)
}
