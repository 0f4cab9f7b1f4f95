//! Fixed-capacity in-memory store
//!
//! Backs unit tests and simulations, and targets whose RAM is retained
//! across suspend. No heap allocation: keys and values live in a heapless
//! map sized for the five schedule fields.

use heapless::{FnvIndexMap, Vec};

use super::{KeyValueStore, MAX_VALUE_LEN};
use crate::errors::{StorageError, StorageResult};

/// Map capacity (power of two, room for every schedule field)
const MAX_KEYS: usize = 8;

/// In-memory [`KeyValueStore`]
///
/// ## Example
///
/// ```rust
/// use sleepguard_core::store::{KeyValueStore, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// store.write_u8("events_index", 3).unwrap();
/// assert_eq!(store.read_u8("events_index").unwrap(), Some(3));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: FnvIndexMap<&'static str, Vec<u8, MAX_VALUE_LEN>, MAX_KEYS>,
    read_only: bool,
    writes: usize,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every write with a backend error (simulates a worn flash)
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Drop one key
    pub fn remove(&mut self, key: &'static str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Number of keys present
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key is present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Successful writes since creation
    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.read_only {
            Err(StorageError::Backend {
                reason: "store is read-only",
            })
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
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
        self.check_writable()?;

        let value = Vec::from_slice(value).map_err(|_| StorageError::CapacityExceeded { key })?;
        self.entries
            .insert(key, value)
            .map_err(|_| StorageError::CapacityExceeded { key })?;
        self.writes += 1;
        Ok(())
    }

    fn contains(&self, key: &'static str) -> StorageResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    fn erase_all(&mut self) -> StorageResult<()> {
        self.check_writable()?;
        self.entries.clear();
        Ok(())
    }
}
