//! Commands that change the store.

use catalogdb_core::{CatalogService, Product, ProductId};
use std::path::Path;
use std::sync::Arc;

fn service(path: &Path, create: bool) -> Result<CatalogService, Box<dyn std::error::Error>> {
    Ok(CatalogService::new(Arc::new(super::open(path, create)?)))
}

/// Runs the add command, creating the store if needed.
pub fn add(path: &Path, product: Product) -> Result<(), Box<dyn std::error::Error>> {
    let created = service(path, true)?.create_product(product)?;
    println!("Added product {} ({})", created.id, created.name);
    Ok(())
}

/// Runs the delete command.
pub fn delete(path: &Path, id: u64) -> Result<(), Box<dyn std::error::Error>> {
    service(path, false)?.delete_product(ProductId::new(id))?;
    println!("Deleted product {id}");
    Ok(())
}

/// Runs the feature command.
pub fn feature(path: &Path, id: u64) -> Result<(), Box<dyn std::error::Error>> {
    service(path, false)?.feature_product(ProductId::new(id))?;
    println!("Product {id} is now featured");
    Ok(())
}

/// Runs the unfeature command.
pub fn unfeature(path: &Path, id: u64) -> Result<(), Box<dyn std::error::Error>> {
    service(path, false)?.unfeature_product(ProductId::new(id))?;
    println!("Product {id} is no longer featured");
    Ok(())
}
