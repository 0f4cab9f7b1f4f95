//! JSON file store (requires `store-file`)
//!
//! Keeps every field in one JSON object on disk, rewritten in full on each
//! write. Writes go to a sibling temporary file which is then renamed over
//! the original, so a crash mid-write leaves either the old or the new
//! contents and never a torn file.
//!
//! An unparsable file is treated as empty. The scheduler then sees an
//! unseeded store and starts a fresh experiment.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::KeyValueStore;
use crate::errors::{StorageError, StorageResult};

/// File-backed [`KeyValueStore`]
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, Vec<u8>>,
}

impl FileStore {
    /// Open `path`, creating nothing until the first write
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(err) => {
                    log_warn!("ignoring unreadable store {}: {}", path.display(), err);
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(_) => {
                return Err(StorageError::Backend {
                    reason: "failed to read store file",
                })
            }
        };

        Ok(Self { path, entries })
    }

    /// Location on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(&self.entries).map_err(|_| StorageError::Backend {
            reason: "failed to encode store",
        })?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|_| StorageError::Backend {
            reason: "failed to write store file",
        })?;
        fs::rename(&tmp, &self.path).map_err(|_| StorageError::Backend {
            reason: "failed to replace store file",
        })
    }
}

impl KeyValueStore for FileStore {
    fn read_blob(&self, key: &'static str, buf: &mut [u8]) -> StorageResult<Option<usize>> {
        let Some(value) = self.entries.get(key) else {
            return Ok(None);
        };

        let dest = buf
            .get_mut(..value.len())
            .ok_or(StorageError::CapacityExceeded { key })?;
        dest.copy_from_slice(value);
        Ok(Some(value.len()))
    }

    fn write_blob(&mut self, key: &'static str, value: &[u8]) -> StorageResult<()> {
        let previous = self.entries.insert(key.to_string(), value.to_vec());

        if let Err(err) = self.persist() {
            // Keep memory in step with what is on disk
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn contains(&self, key: &'static str) -> StorageResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    fn erase_all(&mut self) -> StorageResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(_) => {
                return Err(StorageError::Backend {
                    reason: "failed to remove store file",
                })
            }
        }
        self.entries.clear();
        Ok(())
    }
}
