//! Persistent settings loaded from a JSON file
//!
//! Every field has a default, so a partial or missing settings file yields a
//! usable configuration. [`Settings::to_scan_config`] turns the stored
//! choices into the [`ScanConfig`] a scan consumes.

use crate::models::Category;
use crate::services::backup::PlacementMode;
use crate::services::profiles::{self, UserProfile};
use crate::services::traverse::ReaderKind;
use crate::{Result, ScanConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Folder names never worth scanning in a user profile.
pub const DEFAULT_SKIP_PATTERNS: &[&str] = &["AppData", "$Recycle.Bin"];

/// Pattern added to the skip patterns when `ignore_downloads` is set.
pub const DOWNLOADS_PATTERN: &str = "Downloads";

/// System and toolchain folders skipped by default on Windows.
pub const WINDOWS_SYSTEM_SKIPS: &[&str] = &[
    r"C:\Windows",
    r"C:\Program Files",
    r"C:\Program Files (x86)",
    r"C:\ProgramData",
    r"C:\msys64",
    r"C:\vcpkg",
];

/// Default absolute skip folders for the current platform.
#[must_use]
pub fn default_system_skips() -> Vec<PathBuf> {
    if cfg!(windows) {
        WINDOWS_SYSTEM_SKIPS.iter().map(PathBuf::from).collect()
    } else {
        Vec::new()
    }
}

/// Default settings file name, relative to the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Explicit scan roots, scanned before any user profile.
    pub roots: Vec<PathBuf>,
    /// Profile names to scan. Empty with no explicit roots means every profile.
    pub users: Vec<String>,
    /// Folder holding user profiles; platform default when unset.
    pub profiles_base: Option<PathBuf>,
    pub skip: Vec<PathBuf>,
    pub block: Vec<PathBuf>,
    pub skip_patterns: Vec<String>,
    /// Skip every `Downloads` folder below the scanned roots.
    pub ignore_downloads: bool,
    pub categories: Vec<Category>,
    pub custom_categories: BTreeMap<String, Vec<String>>,
    pub backup_base: PathBuf,
    pub placement: PlacementMode,
    pub reader: Option<ReaderKind>,
    pub progress_interval_ms: u64,
    pub channel_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let scan = ScanConfig::default();
        Self {
            roots: Vec::new(),
            users: Vec::new(),
            profiles_base: None,
            skip: default_system_skips(),
            block: Vec::new(),
            skip_patterns: DEFAULT_SKIP_PATTERNS.iter().map(|p| (*p).to_string()).collect(),
            ignore_downloads: false,
            categories: Category::BUILTIN.to_vec(),
            custom_categories: BTreeMap::new(),
            backup_base: PathBuf::from("backups"),
            placement: PlacementMode::default(),
            reader: None,
            progress_interval_ms: u64::try_from(scan.progress_interval.as_millis())
                .unwrap_or(u64::MAX),
            channel_capacity: scan.channel_capacity,
        }
    }
}

impl Settings {
    /// Load settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        let settings = serde_json::from_str(&raw)?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings as pretty JSON, creating parent folders as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json)?;
        Ok(())
    }

    #[must_use]
    pub fn profiles_base(&self) -> PathBuf {
        self.profiles_base
            .clone()
            .unwrap_or_else(profiles::default_profiles_base)
    }

    /// Explicit roots followed by the selected user profiles.
    #[must_use]
    pub fn resolve_roots(&self) -> Vec<PathBuf> {
        let mut roots = self.roots.clone();

        if !self.roots.is_empty() && self.users.is_empty() {
            return roots;
        }

        let base = self.profiles_base();
        let available: Vec<UserProfile> = match profiles::discover_profiles(&base) {
            Ok(found) => found,
            Err(err) => {
                log::warn!("Could not list user profiles in {}: {err}", base.display());
                Vec::new()
            }
        };

        if self.users.is_empty() {
            roots.extend(available.into_iter().map(|profile| profile.path));
            return roots;
        }

        for user in &self.users {
            match available.iter().find(|p| p.name.eq_ignore_ascii_case(user)) {
                Some(profile) => roots.push(profile.path.clone()),
                None => log::warn!("User profile '{user}' not found in {}", base.display()),
            }
        }

        roots
    }

    /// Build the scan configuration described by these settings.
    #[must_use]
    pub fn to_scan_config(&self) -> ScanConfig {
        let mut skip_patterns = self.skip_patterns.clone();
        if self.ignore_downloads
            && !skip_patterns
                .iter()
                .any(|p| p.trim().eq_ignore_ascii_case(DOWNLOADS_PATTERN))
        {
            skip_patterns.push(DOWNLOADS_PATTERN.to_string());
        }

        ScanConfig {
            roots: self.resolve_roots(),
            categories: self.categories.iter().cloned().collect(),
            skip: self.skip.clone(),
            block: self.block.clone(),
            skip_patterns,
            custom_categories: self.custom_categories.clone(),
            reader_override: self.reader,
            progress_interval: Duration::from_millis(self.progress_interval_ms),
            channel_capacity: self.channel_capacity,
            ..ScanConfig::default()
        }
    }
}
