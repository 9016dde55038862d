//! Destination path computation and collision handling.

use super::PlacementMode;
use crate::models::FileRecord;
use chrono::{DateTime, TimeZone};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Folder name format for a backup run (`YYYYMMDD-HHMMSS`).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Create and return the destination root for a run started at `now`.
///
/// The folder is claimed with `create_dir`, so two runs started in the same
/// second never share a root: the loser moves on to `<stamp>-1`, `<stamp>-2`, ...
pub fn claim_timestamped_root<Tz>(base: &Path, now: &DateTime<Tz>) -> io::Result<PathBuf>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    fs::create_dir_all(base)?;

    let stamp = now.format(TIMESTAMP_FORMAT).to_string();
    let candidates = std::iter::once(stamp.clone()).chain((1u32..).map(|n| format!("{stamp}-{n}")));
    for name in candidates {
        let candidate = base.join(name);
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free backup folder for {stamp} in {}", base.display()),
    ))
}

/// Where `record` lands below `root`, before collision handling.
///
/// Returns `None` when the source path has no usable file name.
#[must_use]
pub fn destination_for(record: &FileRecord, mode: PlacementMode, root: &Path) -> Option<PathBuf> {
    match mode {
        PlacementMode::ByCategory => {
            let name = record.path.file_name()?;
            Some(root.join(record.category.as_str()).join(name))
        }
        PlacementMode::PreserveStructure => {
            let relative = strip_root(&record.path);
            if relative.as_os_str().is_empty() {
                None
            } else {
                Some(root.join(relative))
            }
        }
    }
}

/// Drop the drive/prefix and root of `path`, keeping only named components.
#[must_use]
pub fn strip_root(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

/// First free variant of `path`: `name.ext`, `name(1).ext`, `name(2).ext`, ...
#[must_use]
pub fn resolve_collision(path: PathBuf) -> PathBuf {
    if !occupied(&path) {
        return path;
    }

    (1u32..)
        .map(|n| numbered(&path, n))
        .find(|candidate| !occupied(candidate))
        .unwrap_or(path)
}

/// `path` with a numeric suffix inserted before its last extension.
#[must_use]
pub fn numbered(path: &Path, n: u32) -> PathBuf {
    let stem = path.file_stem().map(OsString::from).unwrap_or_default();
    let mut name = stem;
    name.push(format!("({n})"));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

pub(crate) fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
