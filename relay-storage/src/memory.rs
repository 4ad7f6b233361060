use crate::{KvEntry, Storage, StorageError};

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

#[derive(Debug, Default)]
struct Shared {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    closed: bool,
}

/// In-memory [`Storage`] backend over a shared ordered map.
///
/// Prefix views and clones share the map, so the relay tree and the
/// per-identity sub-trees all live in one flat namespace, exactly as they
/// would over an on-disk backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    shared: Arc<RwLock<Shared>>,
    prefix: Vec<u8>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Shared> {
        match self.shared.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Shared> {
        match self.shared.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn absolute(&self, key: &[u8]) -> Vec<u8> {
        let mut abs = Vec::with_capacity(self.prefix.len() + key.len());
        abs.extend_from_slice(&self.prefix);
        abs.extend_from_slice(key);
        abs
    }

    fn ensure_open(shared: &Shared) -> Result<(), StorageError> {
        if shared.closed {
            return Err(StorageError::Io("storage is closed".into()));
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        let shared = self.read();
        Self::ensure_open(&shared)?;
        shared
            .entries
            .get(&self.absolute(key))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn put_batch(&self, entries: Vec<KvEntry>) -> Result<(), StorageError> {
        let mut shared = self.write();
        Self::ensure_open(&shared)?;
        for (key, value) in entries {
            let abs = self.absolute(&key);
            shared.entries.insert(abs, value);
        }
        Ok(())
    }

    fn with_prefix(&self, prefix: &[u8]) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            prefix: self.absolute(prefix),
        }
    }

    fn list(&self, limit: i64) -> Result<Vec<KvEntry>, StorageError> {
        let mut out = Vec::new();
        self.iterate(&[], |key, value| {
            out.push((key.to_vec(), value.to_vec()));
            limit <= 0 || (out.len() as i64) < limit
        })?;
        Ok(out)
    }

    fn iterate<F>(&self, prefix: &[u8], mut f: F) -> Result<(), StorageError>
    where
        F: FnMut(&[u8], &[u8]) -> bool,
    {
        let shared = self.read();
        Self::ensure_open(&shared)?;
        let full = self.absolute(prefix);
        for (key, value) in shared.entries.range(full.clone()..) {
            if !key.starts_with(&full) {
                break;
            }
            if !f(&key[full.len()..], value) {
                break;
            }
        }
        Ok(())
    }

    fn close(&self) {
        self.write().closed = true;
    }
}
