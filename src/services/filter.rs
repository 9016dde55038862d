//! Extension classification and path inclusion rules.
//!
//! The filter engine holds only immutable configuration, so one instance can
//! be shared by reference across every directory visit of a traversal.

use crate::models::Category;
use crate::{Error, Result, ScanConfig};
use glob::{MatchOptions, Pattern};
use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};

const TEXT_EXTENSIONS: &[&str] = &["txt", "asc"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv"];

const PATTERN_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Extensions owned by a built-in category; empty for custom ones.
#[must_use]
pub fn builtin_extensions(category: &Category) -> &'static [&'static str] {
    match category {
        Category::Text => TEXT_EXTENSIONS,
        Category::Image => IMAGE_EXTENSIONS,
        Category::Video => VIDEO_EXTENSIONS,
        Category::Custom(_) => &[],
    }
}

/// Pure classification and skip/block evaluation.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    requested: BTreeSet<Category>,
    extensions: HashMap<String, Category>,
    skip: Vec<PathBuf>,
    block: Vec<PathBuf>,
    skip_patterns: Vec<Pattern>,
}

impl FilterEngine {
    /// Build the engine, normalizing skip/block entries to absolute paths.
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let mut extensions = HashMap::new();

        for category in Category::BUILTIN {
            for ext in builtin_extensions(&category) {
                extensions
                    .entry((*ext).to_string())
                    .or_insert_with(|| category.clone());
            }
        }

        for (name, group) in &config.custom_categories {
            let category = Category::from(name.clone());
            for raw in group {
                let ext = normalize_extension(raw);
                if ext.is_empty() {
                    continue;
                }
                if let Some(owner) = extensions.get(&ext) {
                    log::debug!("Extension '.{ext}' already owned by '{owner}', ignored for '{category}'");
                    continue;
                }
                extensions.insert(ext, category.clone());
            }
        }

        let skip_patterns = config
            .skip_patterns
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| {
                Pattern::new(p.trim()).map_err(|e| {
                    Error::InvalidConfig(format!("invalid skip pattern '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            requested: config.categories.clone(),
            extensions,
            skip: absolutize_all(&config.skip)?,
            block: absolutize_all(&config.block)?,
            skip_patterns,
        })
    }

    /// Category for the file at `path`, limited to the requested categories.
    #[must_use]
    pub fn classify(&self, path: &Path) -> Option<Category> {
        self.category_of(path)
            .filter(|category| self.requested.contains(category))
            .cloned()
    }

    /// Category owning the file's extension, regardless of the requested set.
    #[must_use]
    pub fn category_of(&self, path: &Path) -> Option<&Category> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.extensions.get(&ext)
    }

    /// True if `dir` is, or lies beneath, a skipped folder.
    ///
    /// Skip entries are absolute and apply anywhere. Name patterns only test
    /// the components of `dir` below `root`, the root being walked, so a root
    /// that itself sits inside a matching folder is still scanned.
    #[must_use]
    pub fn is_skipped(&self, dir: &Path, root: &Path) -> bool {
        if self.skip.iter().any(|entry| dir.starts_with(entry)) {
            return true;
        }

        if self.skip_patterns.is_empty() {
            return false;
        }

        let below_root = dir.strip_prefix(root).unwrap_or(dir);
        below_root.components().any(|component| match component {
            Component::Normal(name) => name.to_str().is_some_and(|name| {
                self.skip_patterns
                    .iter()
                    .any(|pattern| pattern.matches_with(name, PATTERN_OPTIONS))
            }),
            _ => false,
        })
    }

    /// True if `dir` is, or lies beneath, a blocked folder.
    #[must_use]
    pub fn is_blocked(&self, dir: &Path) -> bool {
        self.block.iter().any(|entry| dir.starts_with(entry))
    }

    #[must_use]
    pub fn requested(&self) -> &BTreeSet<Category> {
        &self.requested
    }
}

fn normalize_extension(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('*')
        .trim_start_matches('.')
        .to_ascii_lowercase()
}

fn absolutize_all(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    paths.iter().map(|p| absolutize(p).map_err(Error::from)).collect()
}

/// Make `path` absolute against the working directory and resolve `.`/`..`
/// without touching the filesystem.
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    Ok(normalize_lexically(&absolute))
}

/// Resolve `.` and `..` components lexically.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = matches!(
                    normalized.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                );
                if !at_root {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
