//! Directory listing backends.
//!
//! A reader turns one directory into its immediate children, already stat-ed
//! (without following symlinks) and sorted by name. The walk never touches
//! `read_dir` directly, which lets tests count reads per directory.

use super::ReaderKind;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Directories with at least this many entries are stat-ed on the rayon pool.
const PARALLEL_STAT_THRESHOLD: usize = 64;

/// Type of a directory child as reported by `lstat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File {
        size_bytes: u64,
        modified: Option<SystemTime>,
    },
    Directory,
    Symlink,
    Other,
}

impl EntryKind {
    #[must_use]
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File {
                size_bytes: metadata.len(),
                modified: metadata.modified().ok(),
            }
        } else {
            EntryKind::Other
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirChild {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Children of one directory plus the entries that could not be inspected.
#[derive(Debug, Default)]
pub struct Listing {
    pub children: Vec<DirChild>,
    pub errors: Vec<(PathBuf, io::Error)>,
}

/// Common interface implemented by directory listing backends.
pub trait DirectoryReader: Send + Sync {
    /// Identify the backend for logging and scan results.
    fn kind(&self) -> ReaderKind;

    /// List the immediate children of `dir`, sorted by name.
    ///
    /// An `Err` means the directory itself could not be opened.
    fn read_dir(&self, dir: &Path) -> io::Result<Listing>;
}

/// Stat every path in `paths` and build a name-sorted listing.
pub(crate) fn stat_children(paths: Vec<PathBuf>, mut errors: Vec<(PathBuf, io::Error)>) -> Listing {
    let stat = |path: PathBuf| match fs::symlink_metadata(&path) {
        Ok(metadata) => Ok(DirChild {
            kind: EntryKind::from_metadata(&metadata),
            path,
        }),
        Err(err) => Err((path, err)),
    };

    let outcomes: Vec<Result<DirChild, (PathBuf, io::Error)>> =
        if paths.len() >= PARALLEL_STAT_THRESHOLD {
            paths.into_par_iter().map(stat).collect()
        } else {
            paths.into_iter().map(stat).collect()
        };

    let mut children = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok(child) => children.push(child),
            Err(failure) => errors.push(failure),
        }
    }

    children.sort_by(|a, b| a.path.cmp(&b.path));

    Listing { children, errors }
}
