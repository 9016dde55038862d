//! Data models for scan records, results, backup reports, and errors

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

/// Classification bucket derived from a file extension.
///
/// Built-in buckets cover plain text, images, and videos; user-defined
/// extension groups are carried as `Custom` with their lowercase name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Text,
    Image,
    Video,
    Custom(String),
}

impl Category {
    /// Built-in categories in table order.
    pub const BUILTIN: [Category; 3] = [Category::Text, Category::Image, Category::Video];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Category::Text => "text",
            Category::Image => "image",
            Category::Video => "video",
            Category::Custom(name) => name,
        }
    }

    #[must_use]
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Category::Custom(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        let lowered = label.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "text" => Category::Text,
            "image" => Category::Image,
            "video" => Category::Video,
            _ => Category::Custom(lowered),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("category name must not be empty".to_string());
        }
        Ok(Category::from(s.to_string()))
    }
}

/// Kind of a per-item failure recorded during a scan or backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    AccessDenied,
    PathNotFound,
    CopyFailed,
    Io,
}

impl ErrorKind {
    /// Map an I/O error encountered while reading the tree.
    #[must_use]
    pub fn from_io(error: &std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::PathNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::AccessDenied,
            _ => ErrorKind::Io,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::AccessDenied => "EACCES",
            ErrorKind::PathNotFound => "ENOENT",
            ErrorKind::CopyFailed => "ECOPY",
            ErrorKind::Io => "IO",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::AccessDenied => "access denied",
            ErrorKind::PathNotFound => "path not found",
            ErrorKind::CopyFailed => "copy failed",
            ErrorKind::Io => "I/O error",
        };
        f.write_str(label)
    }
}

/// Represents an error encountered for a single path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorItem {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorItem {
    #[must_use]
    pub fn from_io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self {
            path: path.into(),
            kind: ErrorKind::from_io(error),
            message: error.to_string(),
        }
    }
}

/// A matched file produced by traversal. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<SystemTime>,
    pub category: Category,
}

/// Number of matched records per category.
pub type CategoryCounts = BTreeMap<Category, u64>;

/// Outcome of one traversal, complete or partial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub roots: Vec<PathBuf>,
    pub records: Vec<FileRecord>,
    pub counts: CategoryCounts,
    pub errors: Vec<ErrorItem>,
    /// Set when the scan stopped early because it was cancelled.
    pub partial: bool,
    pub dirs_visited: u64,
    pub files_visited: u64,
    pub elapsed: Duration,
    pub reader: String,
}

impl ScanResult {
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }

    /// Records belonging to any of the given categories, in scan order.
    pub fn records_in<'a>(
        &'a self,
        categories: &'a [Category],
    ) -> impl Iterator<Item = &'a FileRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| categories.is_empty() || categories.contains(&r.category))
    }
}

/// A file written into the backup destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopiedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub size_bytes: u64,
}

/// Outcome of one backup run, complete or partial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupReport {
    pub destination: PathBuf,
    pub files_copied: u64,
    pub bytes_copied: u64,
    pub copied: Vec<CopiedFile>,
    pub failures: Vec<ErrorItem>,
    pub partial: bool,
    pub elapsed: Duration,
}
