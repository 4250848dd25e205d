//! Repository-style access inside a transaction.

use crate::error::{CoreError, CoreResult};
use crate::records::{ensure_valid, max_id, next_id};
use crate::transaction::{Operation, Transaction};
use catalogdb_codec::{Product, ProductId};

/// Queues repository operations in an open [`Transaction`].
///
/// Reads see the store with the already queued operations applied, so a
/// batch can add a product and then feature it. Nothing reaches the file
/// until the batch returns and the transaction commits.
///
/// Obtained through
/// [`ProductRepository::execute_batch`](crate::ProductRepository::execute_batch).
#[derive(Debug)]
pub struct Batch<'a> {
    txn: Transaction<'a>,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(txn: Transaction<'a>) -> Self {
        Self { txn }
    }

    pub(crate) fn into_transaction(self) -> Transaction<'a> {
        self.txn
    }

    /// Returns every product, including queued changes.
    pub fn get_all(&self) -> CoreResult<Vec<Product>> {
        self.txn.staged()
    }

    /// Returns the product with `id`, including queued changes.
    pub fn get_by_id(&self, id: ProductId) -> CoreResult<Option<Product>> {
        Ok(self.txn.staged()?.into_iter().find(|p| p.id == id))
    }

    /// Queues a new product under the next free id and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the product breaks a field rule,
    /// or [`CoreError::InvalidOperation`] if no id is left.
    pub fn add(&mut self, product: Product) -> CoreResult<Product> {
        let staged = self.txn.staged()?;
        let product = product.with_id(next_id(max_id(&staged))?);
        ensure_valid(&product)?;
        self.txn.create(product.clone())?;
        Ok(product)
    }

    /// Queues replacing the product with the same id.
    pub fn update(&mut self, product: Product) -> CoreResult<()> {
        let original = self.require(product.id)?;
        ensure_valid(&product)?;
        self.txn.update(product, original)
    }

    /// Queues deleting the product with `id`.
    pub fn delete(&mut self, id: ProductId) -> CoreResult<()> {
        let original = self.require(id)?;
        self.txn.delete(original)
    }

    /// Queues making `id` the only featured product.
    pub fn set_featured(&mut self, id: ProductId) -> CoreResult<()> {
        let target = self.require(id)?;
        self.clear_featured_except(Some(id))?;
        if !target.featured {
            self.txn.update(target.clone().with_featured(true), target)?;
        }
        Ok(())
    }

    /// Queues clearing the featured flag of `id`.
    pub fn remove_featured(&mut self, id: ProductId) -> CoreResult<()> {
        let target = self.require(id)?;
        if target.featured {
            self.txn.update(target.clone().with_featured(false), target)?;
        }
        Ok(())
    }

    /// Queues clearing every featured flag, returning how many were set.
    pub fn clear_featured(&mut self) -> CoreResult<usize> {
        self.clear_featured_except(None)
    }

    /// Queues clearing every featured flag except the one on `keep`.
    pub fn clear_featured_except(&mut self, keep: Option<ProductId>) -> CoreResult<usize> {
        let featured: Vec<Product> = self
            .txn
            .staged()?
            .into_iter()
            .filter(|p| p.featured && Some(p.id) != keep)
            .collect();

        for product in &featured {
            self.txn
                .update(product.clone().with_featured(false), product.clone())?;
        }
        Ok(featured.len())
    }

    /// Queues a raw operation.
    ///
    /// Unlike the other methods nothing is checked until commit.
    pub fn add_operation(&mut self, operation: Operation) -> CoreResult<()> {
        self.txn.add_operation(operation)
    }

    /// Returns the number of queued operations.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.txn.operation_count()
    }

    fn require(&self, id: ProductId) -> CoreResult<Product> {
        self.get_by_id(id)?.ok_or_else(|| CoreError::not_found(id))
    }
}
