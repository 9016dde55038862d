//! JSON results file read/write operations
//!
//! A results file holds one complete [`ScanResult`] so a backup can be run
//! later, or on another machine, without scanning again.

use crate::Result;
use crate::models::ScanResult;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Write a scan result to a pretty-printed JSON file.
pub fn write_results(path: &Path, result: &ScanResult) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    log::debug!(
        "Wrote {} record(s) to {}",
        result.records.len(),
        path.display()
    );
    Ok(())
}

/// Read a scan result previously written by [`write_results`].
pub fn read_results(path: &Path) -> Result<ScanResult> {
    let reader = BufReader::new(File::open(path)?);
    let result: ScanResult = serde_json::from_reader(reader)?;
    Ok(result)
}
