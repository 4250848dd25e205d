//! Catalog operations that keep the single featured product consistent.

use crate::error::CoreResult;
use crate::repository::ProductRepository;
use catalogdb_codec::{Product, ProductId};
use std::sync::Arc;
use tracing::info;

/// Product management on top of a [`ProductRepository`].
///
/// Saving a product with its featured flag set takes the flag away from
/// whichever product had it, in the same batch as the save.
#[derive(Debug, Clone)]
pub struct CatalogService {
    repository: Arc<ProductRepository>,
}

impl CatalogService {
    /// Creates a service over `repository`.
    pub fn new(repository: Arc<ProductRepository>) -> Self {
        Self { repository }
    }

    /// The underlying repository.
    #[must_use]
    pub fn repository(&self) -> &ProductRepository {
        &self.repository
    }

    /// Adds a new product.
    pub fn create_product(&self, product: Product) -> CoreResult<Product> {
        let created = if product.featured {
            self.repository.execute_batch(|batch| {
                batch.clear_featured()?;
                batch.add(product)
            })?
        } else {
            self.repository.add(product)?
        };
        info!(id = %created.id, featured = created.featured, "product created");
        Ok(created)
    }

    /// Saves changes to an existing product.
    pub fn update_product(&self, product: Product) -> CoreResult<()> {
        let id = product.id;
        if product.featured {
            self.repository.execute_batch(|batch| {
                batch.clear_featured_except(Some(id))?;
                batch.update(product)
            })?;
        } else {
            self.repository.update(product)?;
        }
        info!(%id, "product updated");
        Ok(())
    }

    /// Makes `id` the featured product.
    pub fn feature_product(&self, id: ProductId) -> CoreResult<()> {
        self.repository.set_featured(id)?;
        info!(%id, "product featured");
        Ok(())
    }

    /// Clears the featured flag of `id`.
    pub fn unfeature_product(&self, id: ProductId) -> CoreResult<()> {
        self.repository.remove_featured(id)?;
        info!(%id, "product unfeatured");
        Ok(())
    }

    /// Deletes `id`.
    pub fn delete_product(&self, id: ProductId) -> CoreResult<()> {
        self.repository.delete(id)?;
        info!(%id, "product deleted");
        Ok(())
    }

    /// Returns the featured product, if any.
    pub fn featured_product(&self) -> CoreResult<Option<Product>> {
        self.repository.get_featured()
    }
}
