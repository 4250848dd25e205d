//! The product repository.

use crate::batch::Batch;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::page::Page;
use crate::records::{check_invariants, ensure_valid, next_id, LoadedStore};
use crate::stats::{RepositoryStats, StatsSnapshot};
use crate::transaction::Transaction;
use catalogdb_codec::{Product, ProductId};
use catalogdb_storage::{FileAccessManager, LockRegistry};
use parking_lot::Mutex;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Products stored one per line in a text file.
///
/// Every read loads the whole file; every write rewrites it atomically
/// under the file's lock. Records that fail to decode are skipped by reads
/// with a warning and written back unchanged by writes.
///
/// Repositories opened on the same path with the same [`LockRegistry`]
/// share one lock, so they can be used from many threads at once.
///
/// # Example
///
/// ```rust,ignore
/// use catalogdb_core::{Price, Product, ProductRepository};
/// use catalogdb_storage::LockRegistry;
///
/// let registry = LockRegistry::shared();
/// let repo = ProductRepository::open("products.csv", &registry)?;
///
/// let lamp = repo.add(Product::new("Lamp", "A desk lamp", Price::from_cents(1250), 4, "lamp.png"))?;
/// repo.set_featured(lamp.id)?;
/// assert_eq!(repo.get_featured()?, Some(lamp.with_featured(true)));
/// ```
#[derive(Debug)]
pub struct ProductRepository {
    files: FileAccessManager,
    config: Config,
    last_id: Mutex<Option<ProductId>>,
    stats: RepositoryStats,
}

impl ProductRepository {
    /// Opens the store at `path` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if an interrupted rewrite cannot be recovered or the
    /// store cannot be created.
    pub fn open(path: impl AsRef<Path>, registry: &LockRegistry) -> CoreResult<Self> {
        Self::open_with_config(path, registry, Config::default())
    }

    /// Opens the store at `path`.
    ///
    /// A rewrite interrupted by a crash is recovered first. A missing file
    /// is created empty, unless `config.create_if_missing` is false.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreMissing`] if the file does not exist and
    /// may not be created.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        registry: &LockRegistry,
        config: Config,
    ) -> CoreResult<Self> {
        let path = path.as_ref();
        let files = FileAccessManager::with_config(path, registry, config.access_config());

        if files.recover()? {
            info!(path = %path.display(), "recovered store from interrupted rewrite");
        }

        if !files.exists() {
            if !config.create_if_missing {
                return Err(CoreError::StoreMissing {
                    path: path.to_path_buf(),
                });
            }
            let guard = files.lock();
            if !guard.exists() {
                guard.write_all_lines::<&str>(&[])?;
                info!(path = %path.display(), "created empty store");
            }
        }

        Ok(Self {
            files,
            config,
            last_id: Mutex::new(None),
            stats: RepositoryStats::new(),
        })
    }

    /// Path of the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.files.path()
    }

    /// The settings the repository was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a snapshot of the repository counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns every readable product in file order.
    pub fn get_all(&self) -> CoreResult<Vec<Product>> {
        self.observe("get_all", || Ok(self.load()?.into_products()))
    }

    /// Returns the first product with `id`.
    pub fn get_by_id(&self, id: ProductId) -> CoreResult<Option<Product>> {
        self.observe("get_by_id", || {
            Ok(self.load()?.into_products().into_iter().find(|p| p.id == id))
        })
    }

    /// Returns products whose name contains `term`, ignoring case.
    ///
    /// A blank term matches nothing and does not touch the file.
    pub fn search_by_name(&self, term: &str) -> CoreResult<Vec<Product>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        self.observe("search_by_name", || {
            Ok(filter_by_name(self.load()?.into_products(), term))
        })
    }

    /// Returns page `page` of the products, optionally filtered by name.
    ///
    /// A blank filter is the same as no filter.
    pub fn get_paged(
        &self,
        page: usize,
        page_size: usize,
        term: Option<&str>,
    ) -> CoreResult<Page<Product>> {
        self.observe("get_paged", || {
            let mut products = self.load()?.into_products();
            if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
                products = filter_by_name(products, term);
            }
            Ok(Page::paginate(products, page, page_size))
        })
    }

    /// Returns true if a product has `id`.
    pub fn exists(&self, id: ProductId) -> CoreResult<bool> {
        self.observe("exists", || Ok(self.load()?.contains(id)))
    }

    /// Returns the number of readable products.
    pub fn count(&self) -> CoreResult<usize> {
        self.observe("count", || Ok(self.load()?.products().count()))
    }

    /// Returns the featured product, if any.
    pub fn get_featured(&self) -> CoreResult<Option<Product>> {
        self.observe("get_featured", || {
            Ok(self.load()?.into_products().into_iter().find(|p| p.featured))
        })
    }

    /// Returns the id the next added product would get.
    ///
    /// If the store cannot be read, the answer is derived from the highest
    /// id seen by an earlier successful read.
    ///
    /// # Errors
    ///
    /// Returns the read error if no read has succeeded yet, or
    /// [`CoreError::InvalidOperation`] if the highest id is already
    /// `u64::MAX`.
    pub fn get_next_id(&self) -> CoreResult<ProductId> {
        match self.load() {
            Ok(store) => store.next_id(),
            Err(err) => match *self.last_id.lock() {
                Some(last) => {
                    warn!(error = %err, last_id = %last, "store unreadable, using last known id");
                    next_id(last)
                }
                None => {
                    self.stats.record_failure();
                    Err(err)
                }
            },
        }
    }

    /// Adds `product` under the next free id and returns the stored record.
    ///
    /// The id on `product` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] without touching the file if the
    /// product breaks a field rule, [`CoreError::InvariantViolation`] if it
    /// would be a second featured product, or [`CoreError::InvalidOperation`]
    /// if no id is left above the highest stored one.
    pub fn add(&self, product: Product) -> CoreResult<Product> {
        self.mutate("add", |store| {
            let product = product.with_id(store.next_id()?);
            ensure_valid(&product)?;
            store.push(product.clone());
            Ok(product)
        })
    }

    /// Replaces the product with the same id.
    pub fn update(&self, product: Product) -> CoreResult<()> {
        self.mutate("update", |store| {
            ensure_valid(&product)?;
            let slot = store
                .products_mut()
                .find(|p| p.id == product.id)
                .ok_or_else(|| CoreError::not_found(product.id))?;
            *slot = product;
            Ok(())
        })
    }

    /// Deletes every product with `id`.
    pub fn delete(&self, id: ProductId) -> CoreResult<()> {
        self.mutate("delete", |store| match store.remove(id) {
            0 => Err(CoreError::not_found(id)),
            _ => Ok(()),
        })
    }

    /// Makes `id` the only featured product.
    pub fn set_featured(&self, id: ProductId) -> CoreResult<()> {
        self.mutate("set_featured", |store| {
            if !store.contains(id) {
                return Err(CoreError::not_found(id));
            }
            for product in store.products_mut() {
                product.featured = product.id == id;
            }
            Ok(())
        })
    }

    /// Clears the featured flag of `id`.
    pub fn remove_featured(&self, id: ProductId) -> CoreResult<()> {
        self.mutate("remove_featured", |store| {
            if !store.contains(id) {
                return Err(CoreError::not_found(id));
            }
            for product in store.products_mut().filter(|p| p.id == id) {
                product.featured = false;
            }
            Ok(())
        })
    }

    /// Runs `f` as one all-or-nothing batch.
    ///
    /// The store stays locked while `f` runs. If `f` returns an error the
    /// queued operations are discarded; otherwise they are committed
    /// together. Either way the file is never left half-changed.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or [`CoreError::CommitRejected`] if the
    /// queued operations fail the commit checks.
    pub fn execute_batch<T, F>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Batch<'_>) -> CoreResult<T>,
    {
        self.observe("execute_batch", || {
            let mut batch = Batch::new(Transaction::begin(&self.files)?);
            let outcome = f(&mut batch);
            let mut txn = batch.into_transaction();

            match outcome {
                Ok(value) => match txn.commit() {
                    Ok(()) => {
                        self.stats.record_commit();
                        Ok(value)
                    }
                    Err(err) => {
                        self.stats.record_rollback();
                        Err(err)
                    }
                },
                Err(err) => {
                    if let Err(rollback_err) = txn.rollback() {
                        error!(error = %rollback_err, "batch rollback failed");
                    }
                    self.stats.record_rollback();
                    Err(err)
                }
            }
        })
    }

    /// Opens a transaction on the store.
    ///
    /// The store stays locked until the transaction is dropped; other calls
    /// on this repository from the same thread will deadlock until then.
    pub fn begin_transaction(&self) -> CoreResult<Transaction<'_>> {
        Transaction::begin(&self.files)
    }

    /// Loads the store, logging and counting records that fail to decode.
    fn load(&self) -> CoreResult<LoadedStore> {
        let contents = self.files.read_bytes()?;
        Ok(self.parse(&contents))
    }

    fn parse(&self, contents: &[u8]) -> LoadedStore {
        let store = LoadedStore::parse(contents);
        self.stats.record_read();

        if !store.errors().is_empty() {
            for err in store.errors() {
                warn!(path = %self.path().display(), error = %err, "skipping unreadable record");
            }
            self.stats.record_skipped(store.errors().len());
        }

        let max = store.max_id();
        if max.is_assigned() {
            *self.last_id.lock() = Some(max);
        }
        store
    }

    /// Read-modify-write under one acquisition of the file lock.
    fn mutate<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut LoadedStore) -> CoreResult<T>,
    ) -> CoreResult<T> {
        self.observe(operation, || {
            let guard = self.files.lock();
            let contents = guard.read_bytes()?;
            let mut store = self.parse(&contents);

            let value = f(&mut store)?;

            let breaches = check_invariants(store.products());
            if !breaches.is_empty() {
                return Err(CoreError::InvariantViolation { breaches });
            }

            guard.write_all_lines(&store.encode())?;
            self.stats.record_write();

            let max = store.max_id();
            if max.is_assigned() {
                *self.last_id.lock() = Some(max);
            }
            Ok(value)
        })
    }

    fn observe<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce() -> CoreResult<T>,
    ) -> CoreResult<T> {
        let started = Instant::now();
        let result = f();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => debug!(operation, elapsed_ms, outcome = "ok", "repository operation"),
            Err(err) => {
                self.stats.record_failure();
                warn!(operation, elapsed_ms, outcome = "error", error = %err, "repository operation failed");
            }
        }
        result
    }
}

fn filter_by_name(products: Vec<Product>, term: &str) -> Vec<Product> {
    let needle = term.to_lowercase();
    products
        .into_iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .collect()
}
