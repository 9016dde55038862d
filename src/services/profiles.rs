//! Discovery of user profile directories to offer as scan roots.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Profile folders that never belong to a person.
const IGNORED_PROFILES: &[&str] = &["public", "default", "default user", "all users"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub path: PathBuf,
}

/// Folder holding user profiles on this platform.
#[must_use]
pub fn default_profiles_base() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\Users")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Users")
    } else {
        PathBuf::from("/home")
    }
}

/// List the profile directories directly below `base`, sorted by name.
pub fn discover_profiles(base: &Path) -> io::Result<Vec<UserProfile>> {
    let mut profiles = Vec::new();

    for entry in fs::read_dir(base)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::debug!("Skipping unreadable entry in {}: {err}", base.display());
                continue;
            }
        };

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };

        if is_ignored_profile(&name) {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            profiles.push(UserProfile { name, path });
        }
    }

    profiles.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(profiles)
}

#[must_use]
pub fn is_ignored_profile(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    IGNORED_PROFILES.contains(&lowered.as_str())
}
