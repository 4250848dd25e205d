//! Stress tests for CatalogDB.
//!
//! These tests verify behavior under heavy load and concurrent access.

use crate::fixtures::{sample_product, test_config, TestStore};
use catalogdb_core::{CoreError, ProductId, ProductRepository};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 25,
            threads: 4,
        }
    }
}

/// Counts outcomes across threads.
#[derive(Default)]
struct Tally {
    successful: AtomicUsize,
    failed: AtomicUsize,
}

impl Tally {
    fn record<T>(&self, result: Result<T, CoreError>) {
        match result {
            Ok(_) => self.successful.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.failed.fetch_add(1, Ordering::Relaxed),
        };
    }

    fn finish(&self, started: Instant) -> StressTestResult {
        StressTestResult::new(
            self.successful.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
            started.elapsed(),
        )
    }
}

fn open(store: &TestStore) -> ProductRepository {
    ProductRepository::open_with_config(store.path(), &store.registry, test_config())
        .expect("Failed to open store")
}

/// Adds products from several threads, each with its own repository on the
/// same store.
pub fn stress_concurrent_adds(store: &TestStore, config: &StressConfig) -> StressTestResult {
    let tally = Tally::default();
    let started = Instant::now();

    thread::scope(|s| {
        for t in 0..config.threads {
            let tally = &tally;
            s.spawn(move || {
                let repo = open(store);
                for i in 0..config.operations {
                    tally.record(repo.add(sample_product(&format!("T{t} P{i}"))));
                }
            });
        }
    });

    tally.finish(started)
}

/// Mixes reads, adds, featuring and batches from several threads.
///
/// Operations may fail with not found when another thread deleted their
/// target first; they must never corrupt the store.
pub fn stress_mixed_operations(store: &TestStore, config: &StressConfig) -> StressTestResult {
    let tally = Tally::default();
    let started = Instant::now();

    thread::scope(|s| {
        for t in 0..config.threads {
            let tally = &tally;
            s.spawn(move || {
                let repo = open(store);
                for i in 0..config.operations {
                    let target = ProductId::new(((t * 7 + i) % 10 + 1) as u64);
                    match i % 5 {
                        0 => tally.record(repo.add(sample_product(&format!("T{t} P{i}")))),
                        1 => tally.record(repo.get_all()),
                        2 => tally.record(repo.set_featured(target)),
                        3 => tally.record(repo.execute_batch(|batch| {
                            let added = batch.add(sample_product(&format!("Batch T{t} P{i}")))?;
                            batch.set_featured(added.id)
                        })),
                        _ => tally.record(repo.get_paged(1, 5, Some("p"))),
                    }
                }
            });
        }
    });

    tally.finish(started)
}

/// Runs batches that alternate between committing and failing.
pub fn stress_batch_rollbacks(store: &TestStore, config: &StressConfig) -> StressTestResult {
    let tally = Tally::default();
    let started = Instant::now();

    for i in 0..config.operations {
        let should_fail = i % 2 == 0;
        tally.record(store.execute_batch(|batch| {
            batch.add(sample_product(&format!("Batch {i}")))?;
            if should_fail {
                Err(CoreError::invalid_operation("intentional"))
            } else {
                Ok(())
            }
        }));
    }

    tally.finish(started)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::scenarios;
    use catalogdb_core::check_invariants;

    #[test]
    fn test_concurrent_adds() {
        let store = TestStore::empty();
        let config = StressConfig {
            operations: 20,
            threads: 4,
        };

        let result = stress_concurrent_adds(&store, &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, 80);

        let mut ids: Vec<u64> = store.get_all().unwrap().iter().map(|p| p.id.as_u64()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=80).collect::<Vec<_>>());
        assert!(store.stray_files().is_empty());
    }

    #[test]
    fn test_mixed_operations() {
        let store = scenarios::populated_store(10);
        let result = stress_mixed_operations(&store, &StressConfig::default());

        assert_eq!(result.failed_ops, 0);
        let products = store.get_all().unwrap();
        assert!(check_invariants(&products).is_empty());
        assert_eq!(store.stats().skipped_lines, 0);
        assert!(store.stray_files().is_empty());
    }

    #[test]
    fn test_batch_rollbacks() {
        let store = TestStore::empty();
        let config = StressConfig {
            operations: 20,
            ..Default::default()
        };

        let result = stress_batch_rollbacks(&store, &config);
        assert_eq!(result.successful_ops, 10);
        assert_eq!(result.failed_ops, 10);
        assert_eq!(store.count().unwrap(), 10);
        assert_eq!(store.stats().batches_rolled_back, 10);
        assert!(store.stray_files().is_empty());
    }
}
