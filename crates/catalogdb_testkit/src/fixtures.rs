//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common test scenarios.

use catalogdb_codec::serialize;
use catalogdb_core::{CatalogService, Config, LockRegistry, Price, Product, ProductRepository};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// File name of the store inside a [`TestStore`] directory.
pub const STORE_FILE: &str = "products.csv";

/// A store file in its own temporary directory with automatic cleanup.
pub struct TestStore {
    /// The repository over the store.
    pub repo: Arc<ProductRepository>,
    /// The lock registry shared by every repository opened on the store.
    pub registry: Arc<LockRegistry>,
    path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestStore {
    /// Creates an empty store.
    pub fn empty() -> Self {
        Self::create(None)
    }

    /// Creates a store whose file holds exactly `text`.
    pub fn with_contents(text: &str) -> Self {
        Self::create(Some(text.as_bytes()))
    }

    /// Creates a store whose file holds exactly `bytes`, valid UTF-8 or not.
    pub fn with_bytes(bytes: &[u8]) -> Self {
        Self::create(Some(bytes))
    }

    /// Creates a store holding `products`, one line each.
    pub fn with_products(products: &[Product]) -> Self {
        let text: String = products
            .iter()
            .map(|p| format!("{}\n", serialize(p)))
            .collect();
        Self::with_contents(&text)
    }

    fn create(contents: Option<&[u8]>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(STORE_FILE);
        if let Some(contents) = contents {
            fs::write(&path, contents).expect("Failed to write store file");
        }

        let registry = LockRegistry::shared();
        let repo = ProductRepository::open_with_config(&path, &registry, test_config())
            .expect("Failed to open store");

        Self {
            repo: Arc::new(repo),
            registry,
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Path of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file contents as text.
    pub fn contents(&self) -> String {
        fs::read_to_string(&self.path).expect("Failed to read store file")
    }

    /// Current file contents as bytes.
    pub fn bytes(&self) -> Vec<u8> {
        fs::read(&self.path).expect("Failed to read store file")
    }

    /// Opens another repository on the same file and lock.
    pub fn reopen(&self) -> ProductRepository {
        ProductRepository::open_with_config(&self.path, &self.registry, test_config())
            .expect("Failed to reopen store")
    }

    /// A service over this store's repository.
    pub fn service(&self) -> CatalogService {
        CatalogService::new(Arc::clone(&self.repo))
    }

    /// Files next to the store other than the store itself, such as
    /// leftover backups or staging files.
    pub fn stray_files(&self) -> Vec<PathBuf> {
        let dir = self.path.parent().expect("Store has a parent directory");
        let mut stray: Vec<PathBuf> = fs::read_dir(dir)
            .expect("Failed to list store directory")
            .map(|entry| entry.expect("Failed to read directory entry").path())
            .filter(|p| p != &self.path)
            .collect();
        stray.sort();
        stray
    }
}

impl std::ops::Deref for TestStore {
    type Target = ProductRepository;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

/// Settings with short waits so failing tests fail fast.
pub fn test_config() -> Config {
    Config::new()
        .read_lock_timeout(Duration::from_millis(500))
        .read_retries(1)
        .retry_delay(Duration::from_millis(5))
}

/// A valid, unstored, non-featured product named `name`.
pub fn sample_product(name: &str) -> Product {
    Product::new(
        name,
        format!("Sample {name}"),
        Price::from_cents(999),
        5,
        format!("{}.jpg", name.to_lowercase().replace(' ', "_")),
    )
}

/// Runs a test with a temporary empty store.
///
/// # Example
///
/// ```rust,ignore
/// use catalogdb_testkit::with_temp_store;
///
/// #[test]
/// fn my_test() {
///     with_temp_store(|repo| {
///         assert_eq!(repo.count().unwrap(), 0);
///     });
/// }
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&ProductRepository) -> R,
{
    let store = TestStore::empty();
    f(&store.repo)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a store holding `count` products with ids `1..=count`.
    pub fn populated_store(count: usize) -> TestStore {
        let store = TestStore::empty();
        for i in 0..count {
            store
                .add(sample_product(&format!("Product {i}")))
                .expect("Failed to add product");
        }
        store
    }

    /// Creates the two-product store used throughout the docs: an unfeatured
    /// Widget (id 1) and a featured Gadget (id 2).
    pub fn widget_and_gadget() -> TestStore {
        TestStore::with_contents(
            "1,Widget,A simple widget,9.99,5,widget.jpg,false\n\
             2,Gadget,A handy gadget,19.99,2,gadget.png,true\n",
        )
    }
}
