//! Depth-first walk shared by every reader backend.

use super::reader::{DirectoryReader, EntryKind};
use crate::models::{CategoryCounts, ErrorItem, FileRecord, ScanResult};
use crate::services::cancel::CancelToken;
use crate::services::filter::FilterEngine;
use crate::services::progress::{ProgressEvent, ProgressReporter};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Mutable state of one traversal. Lives on the worker thread only.
pub(crate) struct TraversalContext<'a> {
    filter: &'a FilterEngine,
    reader: &'a dyn DirectoryReader,
    cancel: &'a CancelToken,
    reporter: ProgressReporter,
    /// Root being walked; skip patterns only see components below it.
    root: PathBuf,
    records: Vec<FileRecord>,
    counts: CategoryCounts,
    errors: Vec<ErrorItem>,
    dirs_visited: u64,
    files_visited: u64,
    partial: bool,
}

impl<'a> TraversalContext<'a> {
    pub(crate) fn new(
        filter: &'a FilterEngine,
        reader: &'a dyn DirectoryReader,
        cancel: &'a CancelToken,
        reporter: ProgressReporter,
    ) -> Self {
        Self {
            filter,
            reader,
            cancel,
            reporter,
            root: PathBuf::new(),
            records: Vec::new(),
            counts: CategoryCounts::new(),
            errors: Vec::new(),
            dirs_visited: 0,
            files_visited: 0,
            partial: false,
        }
    }

    pub(crate) fn is_partial(&self) -> bool {
        self.partial
    }

    /// Walk one root directory.
    pub(crate) fn walk_root(&mut self, root: &Path) {
        if self.cancel.is_cancelled() {
            self.partial = true;
            return;
        }

        match fs::metadata(root) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                let err = std::io::Error::other("root is not a directory");
                self.record_error(root, &err);
                return;
            }
            Err(err) => {
                self.record_error(root, &err);
                return;
            }
        }

        self.root = root.to_path_buf();
        let mut ancestors = Vec::new();
        self.walk_dir(root, &mut ancestors);
    }

    fn walk_dir(&mut self, dir: &Path, ancestors: &mut Vec<PathBuf>) {
        if self.cancel.is_cancelled() {
            self.partial = true;
            return;
        }

        if self.filter.is_skipped(dir, &self.root) {
            log::debug!("Skipped directory: {}", dir.display());
            return;
        }

        let canonical = match fs::canonicalize(dir) {
            Ok(path) => path,
            Err(err) => {
                self.record_error(dir, &err);
                return;
            }
        };

        if ancestors.contains(&canonical) {
            log::debug!(
                "Cycle detected at {} (resolves to {}), pruned",
                dir.display(),
                canonical.display()
            );
            return;
        }

        let listing = match self.reader.read_dir(dir) {
            Ok(listing) => listing,
            Err(err) => {
                self.record_error(dir, &err);
                return;
            }
        };

        self.dirs_visited += 1;
        self.tick(dir);

        for (path, err) in &listing.errors {
            self.record_error(path, err);
        }

        let blocked = self.filter.is_blocked(dir);
        if blocked {
            log::trace!("Blocked directory, results hidden: {}", dir.display());
        }

        ancestors.push(canonical);

        for child in listing.children {
            match child.kind {
                EntryKind::File {
                    size_bytes,
                    modified,
                } => self.visit_file(child.path, size_bytes, modified, blocked),
                EntryKind::Directory => self.walk_dir(&child.path, ancestors),
                EntryKind::Symlink => self.follow_symlink(child.path, blocked, ancestors),
                EntryKind::Other => {}
            }

            if self.partial {
                break;
            }
        }

        ancestors.pop();
    }

    fn follow_symlink(&mut self, path: PathBuf, blocked: bool, ancestors: &mut Vec<PathBuf>) {
        match fs::metadata(&path) {
            Ok(target) if target.is_dir() => self.walk_dir(&path, ancestors),
            Ok(target) if target.is_file() => {
                self.visit_file(path, target.len(), target.modified().ok(), blocked);
            }
            Ok(_) => {}
            Err(err) => self.record_error(&path, &err),
        }
    }

    fn visit_file(
        &mut self,
        path: PathBuf,
        size_bytes: u64,
        modified: Option<SystemTime>,
        blocked: bool,
    ) {
        self.files_visited += 1;

        if !blocked && let Some(category) = self.filter.classify(&path) {
            log::trace!("Matched {} as {category}", path.display());
            *self.counts.entry(category.clone()).or_insert(0) += 1;
            self.records.push(FileRecord {
                path: path.clone(),
                size_bytes,
                modified,
                category,
            });
        }

        self.tick(&path);
    }

    fn tick(&mut self, current: &Path) {
        let processed = self.dirs_visited + self.files_visited;
        let counts = &self.counts;
        self.reporter.tick(processed, || {
            vec![
                ProgressEvent::Visiting(current.to_path_buf()),
                ProgressEvent::Counts(counts.clone()),
            ]
        });
    }

    fn record_error(&mut self, path: &Path, err: &std::io::Error) {
        let item = ErrorItem::from_io(path, err);
        log::warn!("{}: {} ({err})", path.display(), item.kind);
        self.reporter.error(item.path.clone(), item.kind);
        self.errors.push(item);
    }

    pub(crate) fn into_result(self, roots: Vec<PathBuf>) -> ScanResult {
        ScanResult {
            roots,
            records: self.records,
            counts: self.counts,
            errors: self.errors,
            partial: self.partial,
            dirs_visited: self.dirs_visited,
            files_visited: self.files_visited,
            elapsed: self.reporter.elapsed(),
            reader: self.reader.kind().to_string(),
        }
    }
}
