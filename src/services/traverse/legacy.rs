//! Portable reader built on `std::fs::read_dir`. Used on every platform
//! when no optimized backend applies.

use super::ReaderKind;
use super::reader::{DirectoryReader, Listing, stat_children};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyReader;

impl DirectoryReader for LegacyReader {
    fn kind(&self) -> ReaderKind {
        ReaderKind::Legacy
    }

    fn read_dir(&self, dir: &Path) -> io::Result<Listing> {
        let mut paths = Vec::new();
        let mut errors = Vec::new();

        for entry in fs::read_dir(dir)? {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(err) => errors.push((dir.to_path_buf(), err)),
            }
        }

        Ok(stat_children(paths, errors))
    }
}
