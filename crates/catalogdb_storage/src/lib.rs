//! # CatalogDB Storage
//!
//! Locked, atomically rewritten access to one text file.
//!
//! This crate is the lowest layer of CatalogDB. It treats the store as
//! **opaque lines of bytes**: it knows nothing about records, fields or
//! quoting.
//!
//! ## Design Principles
//!
//! - One mutex per file path, shared through an explicit [`LockRegistry`]
//! - Writes replace the whole file with a rename, never in place
//! - A `.bak` copy guards every rewrite until the rename has succeeded
//! - Reads are bounded in how long they wait for the lock
//!
//! ## Example
//!
//! ```rust
//! use catalogdb_storage::{FileAccessManager, LockRegistry};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let registry = LockRegistry::shared();
//! let files = FileAccessManager::new(&dir.path().join("products.csv"), &registry);
//!
//! files.write_all_lines(&["1,Widget,A simple widget,9.99,5,widget.jpg,false"]).unwrap();
//! assert_eq!(files.read_all_lines().unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod file;
mod lock;

pub use config::AccessConfig;
pub use error::{StorageError, StorageResult};
pub use file::{FileAccessManager, FileGuard, BACKUP_SUFFIX, SNAPSHOT_MARKER, TEMP_SUFFIX};
pub use lock::LockRegistry;
