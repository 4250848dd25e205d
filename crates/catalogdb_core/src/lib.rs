//! # CatalogDB Core
//!
//! Product catalog stored as a flat text file.
//!
//! This crate provides:
//! - [`ProductRepository`] for reads, direct writes, search and paging
//! - [`Transaction`] for all-or-nothing batches with backup and restore
//! - [`Batch`] for repository-style access inside a transaction
//! - [`CatalogService`] for saves that keep a single featured product
//! - Counters for monitoring ([`RepositoryStats`])
//!
//! ## Guarantees
//!
//! - Every rewrite replaces the file atomically; a crash leaves the old or
//!   the new contents, never a mix
//! - Ids are unique and at most one product is featured after any write
//! - Records that fail to decode are skipped on read and kept on write

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod config;
mod error;
mod page;
mod records;
mod repository;
mod service;
mod stats;
mod transaction;

pub use batch::Batch;
pub use config::Config;
pub use error::{CommitProblem, CoreError, CoreResult, InvariantBreach};
pub use page::Page;
pub use records::check_invariants;
pub use repository::ProductRepository;
pub use service::CatalogService;
pub use stats::{RepositoryStats, StatsSnapshot};
pub use transaction::{Operation, OperationKind, Transaction, TransactionState};

pub use catalogdb_codec::{Field, Price, Product, ProductId, Violation};
pub use catalogdb_storage::LockRegistry;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
