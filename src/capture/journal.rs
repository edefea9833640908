//! Append-only local journal of readings.
//!
//! The journal is the device-local record that survives hub outages: one
//! human-readable line per reading, flushed to disk before the call returns.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;

use crate::telemetry::Reading;

/// Append-only journal file, one reading per line.
pub struct Journal {
    file: File,
    path: PathBuf,
}

impl Journal {
    /// Open the journal for appending, creating the file if needed.
    ///
    /// The parent directory must already exist; an unreachable journal is a
    /// startup error, not something to paper over mid-run.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { file, path })
    }

    /// Append one reading and flush it to disk before returning.
    pub fn append(&mut self, reading: &Reading) -> io::Result<()> {
        self.file.write_all(format_line(reading).as_bytes())?;
        self.file.flush()?;
        self.file.sync_data()
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Format a reading as its journal line, trailing newline included.
///
/// The shape is fixed: RFC 3339 timestamp, temperature with one decimal,
/// occupancy wire tag, separated by " - ".
pub fn format_line(reading: &Reading) -> String {
    format!(
        "{} - {:.1}°C - {}\n",
        reading.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        reading.temperature,
        reading.occupancy
    )
}
