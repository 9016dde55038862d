//! POSIX reader leveraging `rustix` directory streams.
//!
//! Entries are enumerated through `openat` + `getdents` without going through
//! `std::fs::ReadDir`; on non-Unix targets the reader defers to the legacy
//! backend.

use super::ReaderKind;
use super::reader::{DirectoryReader, Listing};
use std::io;
use std::path::Path;

#[cfg(unix)]
use super::reader::stat_children;
#[cfg(unix)]
use rustix::fs::{self as rfs, Dir, Mode, OFlags};
#[cfg(unix)]
use std::ffi::OsString;
#[cfg(unix)]
use std::os::unix::ffi::OsStringExt;

#[derive(Debug, Default, Clone, Copy)]
pub struct PosixReader;

impl PosixReader {
    #[must_use]
    pub fn is_supported() -> bool {
        cfg!(unix)
    }
}

impl DirectoryReader for PosixReader {
    fn kind(&self) -> ReaderKind {
        ReaderKind::Posix
    }

    fn read_dir(&self, dir: &Path) -> io::Result<Listing> {
        #[cfg(unix)]
        {
            posix_read_dir(dir)
        }

        #[cfg(not(unix))]
        {
            log::debug!("posix::PosixReader invoked on non-Unix platform; falling back to legacy");
            super::legacy::LegacyReader.read_dir(dir)
        }
    }
}

#[cfg(unix)]
fn posix_read_dir(dir: &Path) -> io::Result<Listing> {
    let dir_fd = rfs::openat(
        rfs::CWD,
        dir,
        OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC,
        Mode::empty(),
    )
    .map_err(io::Error::from)?;

    let stream = Dir::read_from(&dir_fd).map_err(io::Error::from)?;

    let mut paths = Vec::new();
    let mut errors = Vec::new();

    for entry_result in stream {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                errors.push((dir.to_path_buf(), io::Error::from(err)));
                continue;
            }
        };

        let name_bytes = entry.file_name().to_bytes();
        if name_bytes == b"." || name_bytes == b".." {
            continue;
        }

        paths.push(dir.join(OsString::from_vec(name_bytes.to_vec())));
    }

    drop(dir_fd);

    Ok(stat_children(paths, errors))
}
