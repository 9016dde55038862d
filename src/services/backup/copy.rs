//! Crash-safe single file copy.
//!
//! Bytes go to a hidden sibling of the destination which is linked into
//! place only after a complete write, so the final path never holds a
//! truncated file. Placing never replaces an existing file: a name taken in
//! the meantime moves the copy on to the next `name(N).ext`.

use super::naming::{numbered, occupied};
use crate::services::cancel::CancelToken;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

const COPY_BUFFER_SIZE: usize = 1024 * 1024;
const PART_SUFFIX: &str = ".fscrape-part";

static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

/// How a single copy ended when no I/O error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The file now lives at `destination`, which may be a numbered variant
    /// of the requested path.
    Copied { destination: PathBuf, bytes: u64 },
    Cancelled,
}

/// Temporary file removed on drop unless persisted.
struct PartFile {
    path: PathBuf,
    armed: bool,
}

impl PartFile {
    /// Move the part file to `destination` or its first free numbered variant.
    fn persist(mut self, destination: &Path) -> io::Result<PathBuf> {
        let candidates = std::iter::once(destination.to_path_buf())
            .chain((1u32..).map(|n| numbered(destination, n)));

        for candidate in candidates {
            match fs::hard_link(&self.path, &candidate) {
                Ok(()) => {
                    if let Err(err) = fs::remove_file(&self.path) {
                        log::warn!("Failed to remove partial file {}: {err}", self.path.display());
                    }
                    self.armed = false;
                    return Ok(candidate);
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(err) => {
                    // Filesystems without hard links: check, then rename.
                    log::trace!("Hard link into {} failed ({err}); renaming", candidate.display());
                    if occupied(&candidate) {
                        continue;
                    }
                    fs::rename(&self.path, &candidate)?;
                    self.armed = false;
                    return Ok(candidate);
                }
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free name for {}", destination.display()),
        ))
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.armed
            && let Err(err) = fs::remove_file(&self.path)
            && err.kind() != io::ErrorKind::NotFound
        {
            log::warn!("Failed to remove partial file {}: {err}", self.path.display());
        }
    }
}

/// Temporary sibling used while `destination` is being written.
///
/// Names are unique per process and call, so concurrent writers aiming at
/// the same destination never share a part file.
#[must_use]
pub fn part_path(destination: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    if let Some(file_name) = destination.file_name() {
        name.push(file_name);
    }
    name.push(format!(
        ".{}-{}",
        std::process::id(),
        PART_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    name.push(PART_SUFFIX);
    destination.with_file_name(name)
}

/// True for names produced by [`part_path`].
#[must_use]
pub fn is_part_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.') && name.ends_with(PART_SUFFIX))
}

/// Copy `source` to `destination`, preserving the modification time.
///
/// Cancellation is checked between chunks; a cancelled copy leaves nothing
/// behind.
pub fn copy_atomically(
    source: &Path,
    destination: &Path,
    cancel: &CancelToken,
) -> io::Result<CopyOutcome> {
    let mut input = File::open(source)?;
    let metadata = input.metadata()?;
    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "source is not a regular file",
        ));
    }

    let outcome = copy_stream(&mut input, metadata.modified().ok(), destination, cancel)?;
    if outcome == CopyOutcome::Cancelled {
        log::debug!("Copy of {} cancelled, discarded partial file", source.display());
    }
    Ok(outcome)
}

fn copy_stream<R: Read>(
    input: &mut R,
    modified: Option<SystemTime>,
    destination: &Path,
    cancel: &CancelToken,
) -> io::Result<CopyOutcome> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    let part = PartFile {
        path: part_path(destination),
        armed: true,
    };
    let mut output = create_part(&part.path)?;

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut written = 0u64;
    loop {
        if cancel.is_cancelled() {
            return Ok(CopyOutcome::Cancelled);
        }

        let read = match input.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        output.write_all(&buffer[..read])?;
        written += read as u64;
    }

    output.flush()?;
    output.sync_all()?;

    if let Some(modified) = modified
        && let Err(err) = output.set_modified(modified)
    {
        log::debug!("Could not preserve mtime for {}: {err}", destination.display());
    }
    drop(output);

    let destination = part.persist(destination)?;
    Ok(CopyOutcome::Copied {
        destination,
        bytes: written,
    })
}

fn create_part(path: &Path) -> io::Result<File> {
    let open = || OpenOptions::new().write(true).create_new(true).open(path);
    match open() {
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            log::debug!("Removing stale partial file {}", path.display());
            fs::remove_file(path)?;
            open()
        }
        other => other,
    }
}
