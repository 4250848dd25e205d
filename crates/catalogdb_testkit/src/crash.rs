//! Crash recovery testing for CatalogDB.
//!
//! A rewrite of the store moves through a fixed sequence of file states
//! (backup copy, staging file, rename, cleanup). This module lays out the
//! files the way a crash at each step would leave them, reopens the store
//! and checks what it recovered.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalogdb_testkit::crash::{CrashPoint, CrashRecoveryHarness};
//!
//! let mut harness = CrashRecoveryHarness::new();
//! assert!(harness.simulate(CrashPoint::DuringStaging).passed);
//! ```

use crate::fixtures::{test_config, STORE_FILE};
use catalogdb_core::{LockRegistry, ProductRepository};
use catalogdb_storage::{BACKUP_SUFFIX, TEMP_SUFFIX};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Store contents before the interrupted rewrite.
pub const BEFORE: &str = "1,Widget,A simple widget,9.99,5,widget.jpg,false\n\
                          2,Gadget,A handy gadget,19.99,2,gadget.png,true\n";

/// Store contents the interrupted rewrite was writing.
pub const AFTER: &str = "1,Widget,A simple widget,9.99,5,widget.jpg,false\n\
                         2,Gadget,A handy gadget,19.99,2,gadget.png,true\n\
                         3,Lamp,A desk lamp,12.50,4,lamp.png,false\n";

/// Points in a rewrite at which a crash can be simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashPoint {
    /// After the backup copy, before the staging file was written.
    AfterBackup,
    /// While the staging file was being written.
    DuringStaging,
    /// After the live file was moved away, before the staging file replaced it.
    BeforeRename,
    /// After the rename, before the backup was removed.
    BeforeCleanup,
}

impl CrashPoint {
    /// Every crash point, in rewrite order.
    pub const ALL: [CrashPoint; 4] = [
        CrashPoint::AfterBackup,
        CrashPoint::DuringStaging,
        CrashPoint::BeforeRename,
        CrashPoint::BeforeCleanup,
    ];

    /// The contents the store must hold after recovery.
    pub fn expected(self) -> &'static str {
        match self {
            CrashPoint::BeforeCleanup => AFTER,
            _ => BEFORE,
        }
    }
}

/// Result of a crash recovery test.
#[derive(Debug, Clone)]
pub struct CrashRecoveryResult {
    /// Whether the test passed.
    pub passed: bool,
    /// The simulated crash point.
    pub point: CrashPoint,
    /// Products expected after recovery.
    pub expected_products: usize,
    /// Products found after recovery.
    pub actual_products: usize,
    /// Any error message.
    pub error: Option<String>,
}

impl CrashRecoveryResult {
    fn fail(point: CrashPoint, expected: usize, actual: usize, error: impl Into<String>) -> Self {
        Self {
            passed: false,
            point,
            expected_products: expected,
            actual_products: actual,
            error: Some(error.into()),
        }
    }
}

/// Test harness for crash recovery scenarios.
pub struct CrashRecoveryHarness {
    dir: TempDir,
    /// Results of the crash recovery tests run so far.
    pub results: Vec<CrashRecoveryResult>,
}

impl CrashRecoveryHarness {
    /// Creates a harness in a fresh temporary directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
            results: Vec::new(),
        }
    }

    /// Path of the store file.
    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join(STORE_FILE)
    }

    /// Simulates a crash at `point`, reopens the store and checks it.
    pub fn simulate(&mut self, point: CrashPoint) -> CrashRecoveryResult {
        let path = self.store_path();
        let result = match lay_out(&path, point) {
            Ok(()) => check_recovery(&path, point),
            Err(err) => CrashRecoveryResult::fail(point, 0, 0, format!("setup failed: {err}")),
        };
        self.results.push(result.clone());
        result
    }

    /// Simulates every crash point in turn.
    pub fn simulate_all(&mut self) -> Vec<CrashRecoveryResult> {
        CrashPoint::ALL.iter().map(|&p| self.simulate(p)).collect()
    }

    /// Returns true if every simulated crash recovered correctly.
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }
}

impl Default for CrashRecoveryHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn lay_out(path: &Path, point: CrashPoint) -> std::io::Result<()> {
    let backup = sibling(path, BACKUP_SUFFIX);
    let temp = sibling(path, TEMP_SUFFIX);
    for stale in [path, backup.as_path(), temp.as_path()] {
        if stale.exists() {
            fs::remove_file(stale)?;
        }
    }

    // Half of the new contents, cut mid-record.
    let partial = &AFTER[..AFTER.len() - 20];

    match point {
        CrashPoint::AfterBackup => {
            fs::write(path, BEFORE)?;
            fs::write(&backup, BEFORE)?;
        }
        CrashPoint::DuringStaging => {
            fs::write(path, BEFORE)?;
            fs::write(&backup, BEFORE)?;
            fs::write(&temp, partial)?;
        }
        CrashPoint::BeforeRename => {
            fs::write(&backup, BEFORE)?;
            fs::write(&temp, partial)?;
        }
        CrashPoint::BeforeCleanup => {
            fs::write(path, AFTER)?;
            fs::write(&backup, BEFORE)?;
        }
    }
    Ok(())
}

fn check_recovery(path: &Path, point: CrashPoint) -> CrashRecoveryResult {
    let expected = point.expected();
    let expected_products = expected.lines().count();

    let repo = match ProductRepository::open_with_config(path, &LockRegistry::new(), test_config())
    {
        Ok(repo) => repo,
        Err(err) => return CrashRecoveryResult::fail(point, expected_products, 0, err.to_string()),
    };
    let actual_products = match repo.count() {
        Ok(count) => count,
        Err(err) => {
            return CrashRecoveryResult::fail(point, expected_products, 0, err.to_string())
        }
    };

    let contents = fs::read_to_string(path).unwrap_or_default();
    let leftovers: Vec<PathBuf> = [BACKUP_SUFFIX, TEMP_SUFFIX]
        .iter()
        .map(|suffix| sibling(path, suffix))
        .filter(|p| p.exists())
        .collect();

    let error = if contents != expected {
        Some(format!("store holds {contents:?}"))
    } else if !leftovers.is_empty() {
        Some(format!("left behind {leftovers:?}"))
    } else {
        None
    };

    CrashRecoveryResult {
        passed: error.is_none(),
        point,
        expected_products,
        actual_products,
        error,
    }
}
