//! CLI command implementations.

pub mod edit;
pub mod inspect;
pub mod list;
pub mod verify;

use catalogdb_core::{Config, LockRegistry, ProductRepository};
use std::path::Path;

/// Opens the store at `path`, creating it only if `create` is set.
pub(crate) fn open(path: &Path, create: bool) -> Result<ProductRepository, Box<dyn std::error::Error>> {
    let registry = LockRegistry::new();
    let config = Config::new().create_if_missing(create);
    Ok(ProductRepository::open_with_config(path, &registry, config)?)
}
