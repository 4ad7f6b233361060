//! Key-value storage abstraction backing the relay's Merkle trees.
//!
//! A [`Storage`] is a flat byte-key/byte-value namespace. Views over the same
//! underlying store are carved out with [`Storage::with_prefix`]; prefixes
//! compose, and every operation of a view transparently prepends its prefix.
//! Mutations go through atomic batches, either directly via
//! [`Storage::put_batch`] or buffered in a [`Transaction`].

#![deny(unsafe_code)]

mod memory;

pub use memory::MemoryStorage;

/// A single key-value pair of a view.
pub type KvEntry = (Vec<u8>, Vec<u8>);

/// Storage error variants.
///
/// Backend-specific failures are folded into `Corruption` (invalid data) or
/// `Io` (failed operation); everything else is fatal to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The requested key has no value in this view.
    #[error("value not found in storage")]
    NotFound,

    /// The stored data is malformed.
    #[error("storage corruption: {0}")]
    Corruption(String),

    /// The underlying backend failed to perform the operation.
    #[error("storage io error: {0}")]
    Io(String),
}

/// A prefixed, batch-writing key-value store.
///
/// Implementations are cheap to clone; clones and prefix views share the
/// underlying backend, so a batch committed through one view is immediately
/// visible to every other view of the same store.
pub trait Storage: Clone + Send + Sync + 'static {
    /// Get the value stored under `key`, or [`StorageError::NotFound`].
    fn get(&self, key: &[u8]) -> Result<Vec<u8>, StorageError>;

    /// Atomically write every entry of the batch. Either all entries become
    /// visible or none do.
    fn put_batch(&self, entries: Vec<KvEntry>) -> Result<(), StorageError>;

    /// A view of this storage whose every operation prepends `prefix`.
    fn with_prefix(&self, prefix: &[u8]) -> Self;

    /// Enumerate up to `limit` entries of this view, with the view prefix
    /// stripped from the keys. `limit <= 0` enumerates everything. The order
    /// is unspecified but stable for a given view state.
    fn list(&self, limit: i64) -> Result<Vec<KvEntry>, StorageError>;

    /// Walk the entries under `prefix` (relative to this view), invoking `f`
    /// with the key suffix and value until `f` returns `false` or the view is
    /// exhausted.
    fn iterate<F>(&self, prefix: &[u8], f: F) -> Result<(), StorageError>
    where
        F: FnMut(&[u8], &[u8]) -> bool;

    /// Open a write transaction on this view.
    fn transaction(&self) -> Transaction<'_, Self>
    where
        Self: Sized,
    {
        Transaction::new(self)
    }

    /// Release the backend. Views over a closed storage fail with
    /// [`StorageError::Io`].
    fn close(&self);
}

/// A buffered write transaction over a [`Storage`] view.
///
/// Reads see the transaction's own pending writes first, then the committed
/// state. The transaction is serialisable with respect to committed state but
/// not isolated across processes.
#[derive(Debug)]
pub struct Transaction<'a, S: Storage> {
    storage: &'a S,
    pending: std::collections::BTreeMap<Vec<u8>, Vec<u8>>,
}

impl<'a, S: Storage> Transaction<'a, S> {
    fn new(storage: &'a S) -> Self {
        Self {
            storage,
            pending: Default::default(),
        }
    }

    /// Get `key` from the pending writes, falling back to committed state.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        match self.pending.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.storage.get(key),
        }
    }

    /// Buffer a write. Nothing is visible outside the transaction until
    /// [`Transaction::commit`].
    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.pending.insert(key.to_vec(), value.to_vec());
    }

    /// Atomically apply every buffered write.
    pub fn commit(self) -> Result<(), StorageError> {
        self.storage.put_batch(self.pending.into_iter().collect())
    }

    /// Drop the transaction without writing anything.
    pub fn discard(self) {}
}
