//! Shared byte storage backing one or more tensors.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Growable byte buffer shared between a tensor and all views derived from it.
///
/// Storage never shrinks: resizing a tensor to fewer elements keeps the allocation so a
/// later resize back up is free.
#[derive(Debug, Default)]
pub struct Storage {
    bytes: RwLock<Vec<u8>>,
}

impl Storage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Storage {
            bytes: RwLock::new(bytes),
        }
    }

    /// Number of bytes currently addressable through this storage.
    pub fn nbytes(&self) -> usize {
        self.read().len()
    }

    /// Address of the first byte of the current allocation.
    ///
    /// Stable across calls unless [`Storage::ensure_nbytes`] had to grow the buffer.
    pub fn data_ptr(&self) -> usize {
        self.read().as_ptr() as usize
    }

    /// Grows the buffer to at least `nbytes`, zero-filling new bytes.
    ///
    /// Returns `true` when the buffer had to grow.
    pub fn ensure_nbytes(&self, nbytes: usize) -> bool {
        let mut guard = self.write();
        if guard.len() >= nbytes {
            return false;
        }
        guard.resize(nbytes, 0);
        true
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.bytes.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.bytes.write().unwrap_or_else(PoisonError::into_inner)
    }
}
