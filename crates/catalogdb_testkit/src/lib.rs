//! # CatalogDB Testkit
//!
//! Test utilities for CatalogDB.
//!
//! This crate provides:
//! - Test fixtures and store helpers
//! - Property-based test generators using proptest
//! - Cross-crate integration test helpers
//! - Crash recovery simulation
//! - Fuzz targets for record decoding and store rewrites
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalogdb_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_store() {
//!     with_temp_store(|repo| {
//!         let lamp = repo.add(sample_product("Lamp")).unwrap();
//!         assert_eq!(lamp.id.as_u64(), 1);
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
