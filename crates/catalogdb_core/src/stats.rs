//! Repository statistics.
//!
//! Counters for monitoring a repository while it runs.
//!
//! # Usage
//!
//! ```rust,ignore
//! let repo = ProductRepository::open(&path, &registry)?;
//! repo.get_all()?;
//!
//! let stats = repo.stats();
//! println!("Reads: {}", stats.reads);
//! println!("Skipped lines: {}", stats.skipped_lines);
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Repository statistics.
///
/// All counters are atomic and can be read while operations are in progress.
#[derive(Debug, Default)]
pub struct RepositoryStats {
    /// Full loads of the store.
    reads: AtomicU64,
    /// Direct rewrites of the store.
    writes: AtomicU64,
    /// Operations that returned an error.
    failures: AtomicU64,
    /// Batches that committed.
    batches_committed: AtomicU64,
    /// Batches that were rolled back.
    batches_rolled_back: AtomicU64,
    /// Records skipped because they failed to decode.
    skipped_lines: AtomicU64,
}

impl RepositoryStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self) {
        self.batches_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rollback(&self) {
        self.batches_rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped(&self, count: usize) {
        self.skipped_lines.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            batches_committed: self.batches_committed.load(Ordering::Relaxed),
            batches_rolled_back: self.batches_rolled_back.load(Ordering::Relaxed),
            skipped_lines: self.skipped_lines.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of repository statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Full loads of the store.
    pub reads: u64,
    /// Direct rewrites of the store.
    pub writes: u64,
    /// Operations that returned an error.
    pub failures: u64,
    /// Batches that committed.
    pub batches_committed: u64,
    /// Batches that were rolled back.
    pub batches_rolled_back: u64,
    /// Records skipped because they failed to decode.
    pub skipped_lines: u64,
}
