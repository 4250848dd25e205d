//! Cross-crate integration test helpers.
//!
//! Provides utilities for checking a repository against an in-memory
//! model of what it should contain.

use crate::fixtures::TestStore;
use crate::generators::RepoAction;
use catalogdb_core::{check_invariants, CoreError, Product, ProductId};
use std::collections::BTreeMap;

/// A test harness for integration testing.
pub struct IntegrationHarness {
    /// The store under test.
    pub store: TestStore,
    /// What the store should contain, by id.
    products: BTreeMap<ProductId, Product>,
}

impl IntegrationHarness {
    /// Creates a new integration harness over an empty store.
    pub fn new() -> Self {
        Self {
            store: TestStore::empty(),
            products: BTreeMap::new(),
        }
    }

    /// Adds a product and tracks it for later verification.
    pub fn add(&mut self, product: Product) -> Product {
        let expected_id = self
            .products
            .keys()
            .next_back()
            .map_or(Some(ProductId::new(1)), |id| id.next())
            .expect("Id space exhausted");
        let added = self.store.add(product).expect("Failed to add product");
        assert_eq!(added.id, expected_id, "Add should use max id + 1");
        self.products.insert(added.id, added.clone());
        added
    }

    /// Updates a product and the tracked copy.
    pub fn update(&mut self, product: Product) {
        self.store
            .update(product.clone())
            .expect("Failed to update product");
        self.products.insert(product.id, product);
    }

    /// Deletes a product and stops tracking it.
    pub fn delete(&mut self, id: ProductId) {
        self.store.delete(id).expect("Failed to delete product");
        self.products.remove(&id);
    }

    /// Features a product and updates tracking.
    pub fn set_featured(&mut self, id: ProductId) {
        self.store.set_featured(id).expect("Failed to feature product");
        for product in self.products.values_mut() {
            product.featured = product.id == id;
        }
    }

    /// Unfeatures a product and updates tracking.
    pub fn remove_featured(&mut self, id: ProductId) {
        self.store
            .remove_featured(id)
            .expect("Failed to unfeature product");
        if let Some(product) = self.products.get_mut(&id) {
            product.featured = false;
        }
    }

    /// Applies a generated action.
    ///
    /// Positions wrap around the tracked products. Updates and adds that
    /// would create a second featured product are expected to be rejected
    /// and leave the store unchanged.
    pub fn apply(&mut self, action: &RepoAction) {
        let ids: Vec<ProductId> = self.products.keys().copied().collect();
        let pick = |i: usize| (!ids.is_empty()).then(|| ids[i % ids.len()]);

        match action {
            RepoAction::Add(product) => {
                self.add(product.clone());
            }
            RepoAction::Update(i, product) => {
                if let Some(id) = pick(*i) {
                    let featured = self.products[&id].featured;
                    self.update(product.clone().with_id(id).with_featured(featured));
                }
            }
            RepoAction::Delete(i) => {
                if let Some(id) = pick(*i) {
                    self.delete(id);
                }
            }
            RepoAction::SetFeatured(i) => {
                if let Some(id) = pick(*i) {
                    self.set_featured(id);
                }
            }
            RepoAction::RemoveFeatured(i) => {
                if let Some(id) = pick(*i) {
                    self.remove_featured(id);
                }
            }
        }
    }

    /// Tries to store a second featured product and checks it is refused.
    pub fn add_second_featured(&mut self, product: Product) {
        let before = self.store.bytes();
        let result = self.store.add(product.with_featured(true));
        if self.featured_count() > 0 {
            assert!(
                matches!(result, Err(CoreError::InvariantViolation { .. })),
                "Second featured product should be refused, got {result:?}"
            );
            assert_eq!(self.store.bytes(), before, "Refused add changed the file");
        } else {
            let added = result.expect("Featured add with no featured product should succeed");
            self.products.insert(added.id, added);
        }
    }

    /// Verifies the store holds exactly the tracked products, in id order,
    /// and satisfies the store-wide rules.
    pub fn verify_all(&self) {
        let actual = self.store.get_all().expect("Failed to read store");
        let expected: Vec<&Product> = self.products.values().collect();
        let actual_refs: Vec<&Product> = actual.iter().collect();
        assert_eq!(actual_refs, expected, "Store contents differ from model");
        assert!(
            check_invariants(&actual).is_empty(),
            "Store breaks invariants: {:?}",
            check_invariants(&actual)
        );
    }

    /// Returns the count of tracked products.
    pub fn tracked_count(&self) -> usize {
        self.products.len()
    }

    fn featured_count(&self) -> usize {
        self.products.values().filter(|p| p.featured).count()
    }
}

impl Default for IntegrationHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Test transaction integration.
pub mod transaction {
    use super::*;
    use crate::fixtures::sample_product;

    /// Tests that a batch with one invalid record changes nothing.
    pub fn test_invalid_batch_changes_nothing(store: &TestStore) {
        let before = store.bytes();

        let result = store.execute_batch(|batch| {
            batch.add(sample_product("Valid One"))?;
            let mut bad = sample_product("Bad");
            bad.image = "bad.tiff".to_string();
            batch.add_operation(catalogdb_core::Operation::create(
                bad.with_id(ProductId::new(9_999)),
            ))?;
            batch.add(sample_product("Valid Two"))?;
            Ok(())
        });

        assert!(
            matches!(result, Err(CoreError::CommitRejected { .. })),
            "Batch should be rejected, got {result:?}"
        );
        assert_eq!(store.bytes(), before, "Rejected batch changed the file");
        assert!(store.stray_files().is_empty(), "Rejected batch left files behind");
    }

    /// Tests that an abandoned transaction restores the store.
    pub fn test_abandoned_transaction(store: &TestStore) {
        let before = store.bytes();
        {
            let mut txn = store.begin_transaction().expect("Failed to begin");
            txn.create(sample_product("Abandoned").with_id(ProductId::new(9_999)))
                .expect("Failed to queue");
        }
        assert_eq!(store.bytes(), before, "Abandoned transaction changed the file");
        assert!(store.stray_files().is_empty());
    }
}
