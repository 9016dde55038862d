//! File Scan & Backup Library
//!
//! This library discovers files of interest under a set of root directories,
//! classifies them by extension into categories, and copies a selected subset
//! into a timestamped backup folder. Traversal honours skipped folders (never
//! read) and blocked folders (read, but hidden from results), reports
//! progress over a bounded channel, and keeps going past per-item failures.

pub mod cli;
pub mod config;
pub mod io;
pub mod models;
pub mod services;

pub use models::{
    BackupReport, Category, CategoryCounts, CopiedFile, ErrorItem, ErrorKind, FileRecord,
    ScanResult,
};
pub use services::backup::{BackupPlan, PlacementMode, backup};
pub use services::cancel::CancelToken;
pub use services::controller::{Controller, RunState};
pub use services::progress::{Outcome, ProgressEvent, ProgressReceiver, ProgressSender};
pub use services::traverse::{ReaderKind, scan, scan_with_reader};

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::result;
use std::time::Duration;

/// Custom error type for the library
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidConfig(String),
    Busy,
    System(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
            Error::Busy => write!(f, "Busy: a scan or backup is already running"),
            Error::System(msg) => write!(f, "System error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Options for a scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directories walked in order.
    pub roots: Vec<PathBuf>,
    /// Categories that produce records.
    pub categories: BTreeSet<Category>,
    /// Directories never descended into.
    pub skip: Vec<PathBuf>,
    /// Directories walked but whose files never appear in results.
    pub block: Vec<PathBuf>,
    /// Folder-name wildcards treated like skip entries (case-insensitive).
    pub skip_patterns: Vec<String>,
    /// User-defined extension groups, keyed by category name.
    pub custom_categories: BTreeMap<String, Vec<String>>,
    pub reader_override: Option<ReaderKind>,
    pub progress_interval: Duration,
    /// Emit progress after this many visited entries even if the interval has not elapsed.
    pub progress_entry_trigger: u64,
    pub channel_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            categories: Category::BUILTIN.into_iter().collect(),
            skip: Vec::new(),
            block: Vec::new(),
            skip_patterns: Vec::new(),
            custom_categories: BTreeMap::new(),
            reader_override: None,
            progress_interval: Duration::from_millis(500),
            progress_entry_trigger: 1_000,
            channel_capacity: 256,
        }
    }
}

impl ScanConfig {
    /// Convenience constructor for a set of roots with the default options.
    #[must_use]
    pub fn for_roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Check the parts of the configuration that make a run impossible.
    pub fn validate(&self) -> Result<()> {
        if self.roots.is_empty() {
            return Err(Error::InvalidConfig("no root directories given".to_string()));
        }

        if self.categories.is_empty() {
            return Err(Error::InvalidConfig("no categories selected".to_string()));
        }

        for name in self.custom_categories.keys() {
            let category = Category::from(name.clone());
            if category.is_builtin() {
                return Err(Error::InvalidConfig(format!(
                    "custom category '{name}' shadows a built-in category"
                )));
            }
        }

        for category in &self.categories {
            if let Category::Custom(name) = category
                && !self
                    .custom_categories
                    .keys()
                    .any(|key| key.eq_ignore_ascii_case(name))
            {
                return Err(Error::InvalidConfig(format!("unknown category '{name}'")));
            }
        }

        Ok(())
    }
}
