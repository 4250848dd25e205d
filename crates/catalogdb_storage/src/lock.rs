//! Process-wide registry of per-path file locks.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Hands out one shared mutex per file path.
///
/// Every [`FileAccessManager`](crate::FileAccessManager) built from the same
/// registry for the same path shares a single lock, so two repositories
/// pointing at one file serialize their writes against each other.
///
/// The registry is an ordinary value with process-scoped lifetime: create
/// one at startup, wrap it in an `Arc`, and pass it to everything that opens
/// a store. Managers built from *different* registries do not coordinate.
///
/// Keys are absolute paths; they are not canonicalized, so a file reached
/// through a symlink is a distinct key.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry already wrapped for sharing.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns the lock for `path`, creating it on first use.
    pub fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let key = registry_key(path);
        Arc::clone(self.locks.lock().entry(key).or_default())
    }

    /// Returns the number of distinct paths seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Returns true if no lock has been handed out yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

fn registry_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
