//! Offline reader for the hub's archival store.
//!
//! [`ArchiveStore`] abstracts where the sink wrote its records; the
//! directory-backed implementation covers a synced-down blob container and
//! the in-memory one backs tests. [`ArchiveReader`] walks a store's objects
//! line by line, decodes what it can and logs what it cannot: one corrupt
//! line never costs more than itself.

pub mod decode;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use tracing::{error, info, warn};

use crate::error::{Result, TelemetryError};
use crate::telemetry::Reading;

pub use decode::{decode_line, DecodeError};

/// Read access to the archival store's objects.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Names of every object in the store.
    async fn list(&self) -> Result<Vec<String>>;

    /// Full text content of one object.
    async fn fetch(&self, name: &str) -> Result<String>;
}

/// Archive store backed by a local directory tree, one file per object.
pub struct DirArchiveStore {
    root: PathBuf,
}

impl DirArchiveStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Collect every file under `root`, as `/`-joined relative names, sorted so
/// scan order does not depend on directory iteration order.
fn walk_files(root: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if let Ok(relative) = path.strip_prefix(root) {
                let name: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                names.push(name.join("/"));
            }
        }
    }
    names.sort();
    Ok(names)
}

#[async_trait]
impl ArchiveStore for DirArchiveStore {
    async fn list(&self) -> Result<Vec<String>> {
        walk_files(&self.root).map_err(|err| {
            TelemetryError::archive_error(format!("cannot scan {}: {err}", self.root.display()))
        })
    }

    async fn fetch(&self, name: &str) -> Result<String> {
        std::fs::read_to_string(self.root.join(name)).map_err(|err| {
            TelemetryError::archive_error(format!("cannot read object {name}: {err}"))
        })
    }
}

/// In-memory archive store. Objects list in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchiveStore {
    objects: Vec<(String, String)>,
}

impl MemoryArchiveStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object.
    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.objects.push((name.into(), content.into()));
    }
}

#[async_trait]
impl ArchiveStore for MemoryArchiveStore {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.objects.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn fetch(&self, name: &str) -> Result<String> {
        self.objects
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| TelemetryError::archive_error(format!("no such object: {name}")))
    }
}

/// Everything one full scan of the store produced.
#[derive(Debug)]
pub struct ArchiveScan {
    /// All readings that decoded cleanly, in object-then-line order
    pub readings: Vec<Reading>,
    /// Objects the store listed
    pub objects: usize,
    /// Non-empty lines that failed to decode
    pub skipped_lines: usize,
    /// Objects that could not be fetched at all
    pub skipped_objects: usize,
}

/// Decodes a store's records back into readings.
pub struct ArchiveReader<S> {
    store: S,
}

impl<S: ArchiveStore> ArchiveReader<S> {
    /// Create a reader over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Scan the whole store eagerly.
    ///
    /// Failing to list the store is fatal; everything below that degrades
    /// per object or per line, logged and counted in the returned scan.
    pub async fn read_all(&self) -> Result<ArchiveScan> {
        let names = self.store.list().await?;
        let mut scan = ArchiveScan {
            readings: Vec::new(),
            objects: names.len(),
            skipped_lines: 0,
            skipped_objects: 0,
        };

        for name in &names {
            let content = match self.store.fetch(name).await {
                Ok(content) => content,
                Err(err) => {
                    warn!(object = %name, %err, "failed to fetch archive object; skipping");
                    scan.skipped_objects += 1;
                    continue;
                }
            };
            for (idx, raw) in content.lines().enumerate() {
                let line = raw.trim();
                if line.is_empty() {
                    continue;
                }
                match decode_line(line) {
                    Ok(reading) => scan.readings.push(reading),
                    Err(err) => {
                        warn!(object = %name, line = idx + 1, %err, "skipping undecodable archive line");
                        scan.skipped_lines += 1;
                    }
                }
            }
        }

        info!(
            objects = scan.objects,
            readings = scan.readings.len(),
            skipped_lines = scan.skipped_lines,
            skipped_objects = scan.skipped_objects,
            "archive scan complete"
        );
        Ok(scan)
    }

    /// Lazily stream readings out of the store.
    ///
    /// Objects are fetched one at a time as the stream is polled. Corrupt
    /// lines and unreachable objects are logged and skipped, the same as in
    /// [`ArchiveReader::read_all`]. Each call starts a fresh scan.
    pub fn stream(&self) -> BoxStream<'_, Reading> {
        struct ScanState {
            names: Option<VecDeque<String>>,
            object: String,
            lines: VecDeque<(usize, String)>,
        }

        let state = ScanState {
            names: None,
            object: String::new(),
            lines: VecDeque::new(),
        };

        Box::pin(stream::unfold(
            (self, state),
            |(reader, mut state)| async move {
                loop {
                    if state.names.is_none() {
                        match reader.store.list().await {
                            Ok(listed) => state.names = Some(listed.into()),
                            Err(err) => {
                                error!(%err, "failed to enumerate archive store");
                                state.names = Some(VecDeque::new());
                            }
                        }
                    }

                    while let Some((line_no, line)) = state.lines.pop_front() {
                        match decode_line(&line) {
                            Ok(reading) => return Some((reading, (reader, state))),
                            Err(err) => {
                                warn!(
                                    object = %state.object,
                                    line = line_no,
                                    %err,
                                    "skipping undecodable archive line"
                                );
                            }
                        }
                    }

                    let name = match state.names.as_mut().and_then(|names| names.pop_front()) {
                        Some(name) => name,
                        None => return None,
                    };
                    match reader.store.fetch(&name).await {
                        Ok(content) => {
                            state.lines = content
                                .lines()
                                .enumerate()
                                .filter_map(|(idx, raw)| {
                                    let line = raw.trim();
                                    (!line.is_empty()).then(|| (idx + 1, line.to_string()))
                                })
                                .collect();
                            state.object = name;
                        }
                        Err(err) => {
                            warn!(object = %name, %err, "failed to fetch archive object; skipping");
                        }
                    }
                }
            },
        ))
    }
}
