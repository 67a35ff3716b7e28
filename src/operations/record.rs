// Sync Record Store
// Durable record of which items are on the destination and at which fingerprint

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::Fingerprint;
use crate::error::{Result, SyncError};
use crate::utilities::is_item_name;

/// Item name -> fingerprint it had when last synced. A key is present
/// exactly when the item is on the destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncRecord {
    entries: BTreeMap<String, Fingerprint>,
}

impl SyncRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Fingerprint> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, fingerprint: Fingerprint) {
        self.entries.insert(name.into(), fingerprint);
    }

    pub fn remove(&mut self, name: &str) -> Option<Fingerprint> {
        self.entries.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Fingerprint)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Fingerprint)> for SyncRecord {
    fn from_iter<I: IntoIterator<Item = (S, Fingerprint)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Loads and persists the sync record as a JSON object
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record. Never fails: a missing, unreadable or corrupt file
    /// degrades to an empty record, which at worst causes re-adds.
    pub fn load(&self) -> SyncRecord {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No sync record at {}, starting empty", self.path.display());
                return SyncRecord::new();
            }
            Err(e) => {
                warn!(
                    "Cannot read sync record {}: {}; treating destination as empty",
                    self.path.display(),
                    e
                );
                return SyncRecord::new();
            }
        };

        match serde_json::from_str::<SyncRecord>(&content) {
            Ok(record) => {
                let record = Self::drop_unsafe_names(record, &self.path);
                debug!("Loaded {} record entries from {}", record.len(), self.path.display());
                record
            }
            Err(e) => {
                warn!(
                    "Sync record {} is corrupt: {}; treating destination as empty",
                    self.path.display(),
                    e
                );
                SyncRecord::new()
            }
        }
    }

    /// Keys become paths under the destination; anything but a plain item
    /// name could reach outside it when planned as a delete.
    fn drop_unsafe_names(record: SyncRecord, path: &Path) -> SyncRecord {
        record
            .iter()
            .filter(|(name, _)| {
                let ok = is_item_name(name);
                if !ok {
                    warn!("Ignoring invalid entry {:?} in sync record {}", name, path.display());
                }
                ok
            })
            .collect()
    }

    /// Write the record atomically: temp file in the same directory, flushed
    /// to disk, then renamed over the old one.
    pub fn save(&self, record: &SyncRecord) -> Result<()> {
        let io_err = |source: io::Error| SyncError::RecordIo {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let content = serde_json::to_string_pretty(record)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(content.as_bytes()).map_err(io_err)?;
        tmp.write_all(b"\n").map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        info!("Saved {} record entries to {}", record.len(), self.path.display());
        Ok(())
    }
}
