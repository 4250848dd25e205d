//! Loading store bytes into records and checking store-wide rules.

use crate::error::{CoreError, CoreResult, InvariantBreach};
use catalogdb_codec::{serialize, split_records, validate, CodecError, Product, ProductId};
use std::collections::HashSet;

/// One record of a loaded store.
#[derive(Debug, Clone)]
pub(crate) enum StoredLine {
    /// A record that decoded.
    Record(Product),
    /// A record that did not decode, kept byte for byte.
    Malformed(Vec<u8>),
}

/// A leniently loaded store.
///
/// Records that fail to decode are kept as raw bytes so a rewrite puts them
/// back where they were instead of dropping them.
#[derive(Debug, Clone, Default)]
pub(crate) struct LoadedStore {
    lines: Vec<StoredLine>,
    errors: Vec<CodecError>,
}

impl LoadedStore {
    /// Loads store contents, collecting decode errors instead of failing.
    pub fn parse(contents: impl AsRef<[u8]>) -> Self {
        let mut store = Self::default();
        for raw in split_records(contents) {
            match raw.decode() {
                Ok(product) => store.lines.push(StoredLine::Record(product)),
                Err(err) => {
                    store.errors.push(err);
                    store.lines.push(StoredLine::Malformed(raw.bytes));
                }
            }
        }
        store
    }

    /// Decode errors found while loading.
    pub fn errors(&self) -> &[CodecError] {
        &self.errors
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.lines.iter().filter_map(|line| match line {
            StoredLine::Record(product) => Some(product),
            StoredLine::Malformed(_) => None,
        })
    }

    pub fn products_mut(&mut self) -> impl Iterator<Item = &mut Product> {
        self.lines.iter_mut().filter_map(|line| match line {
            StoredLine::Record(product) => Some(product),
            StoredLine::Malformed(_) => None,
        })
    }

    pub fn into_products(self) -> Vec<Product> {
        self.lines
            .into_iter()
            .filter_map(|line| match line {
                StoredLine::Record(product) => Some(product),
                StoredLine::Malformed(_) => None,
            })
            .collect()
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.products().any(|p| p.id == id)
    }

    pub fn max_id(&self) -> ProductId {
        max_id(self.products())
    }

    pub fn push(&mut self, product: Product) {
        self.lines.push(StoredLine::Record(product));
    }

    /// Id for a new record: one past the highest stored id.
    pub fn next_id(&self) -> CoreResult<ProductId> {
        next_id(self.max_id())
    }

    /// Removes every record with `id`, returning how many were removed.
    pub fn remove(&mut self, id: ProductId) -> usize {
        let before = self.lines.len();
        self.lines
            .retain(|line| !matches!(line, StoredLine::Record(p) if p.id == id));
        before - self.lines.len()
    }

    /// Encodes the store back into record lines.
    pub fn encode(&self) -> Vec<Vec<u8>> {
        self.lines
            .iter()
            .map(|line| match line {
                StoredLine::Record(product) => serialize(product).into_bytes(),
                StoredLine::Malformed(bytes) => bytes.clone(),
            })
            .collect()
    }
}

/// Decodes every record, failing with all decode errors if any record is bad.
pub(crate) fn parse_strict(
    contents: impl AsRef<[u8]>,
) -> Result<Vec<Product>, Vec<CodecError>> {
    let store = LoadedStore::parse(contents);
    if store.errors.is_empty() {
        Ok(store.into_products())
    } else {
        Err(store.errors)
    }
}

/// Highest id among `products`, or [`ProductId::UNASSIGNED`] if there are none.
pub(crate) fn max_id<'a>(products: impl IntoIterator<Item = &'a Product>) -> ProductId {
    products
        .into_iter()
        .map(|p| p.id)
        .max()
        .unwrap_or(ProductId::UNASSIGNED)
}

/// The id after `max`, failing once the id space is used up.
pub(crate) fn next_id(max: ProductId) -> CoreResult<ProductId> {
    max.next()
        .ok_or_else(|| CoreError::invalid_operation("product id space exhausted"))
}

/// Fails with every broken field rule of `product`.
pub(crate) fn ensure_valid(product: &Product) -> CoreResult<()> {
    let violations = validate(product);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(CoreError::validation(violations))
    }
}

/// Checks that ids are unique and that at most one product is featured.
///
/// Every breach is reported; an empty result means the products are
/// consistent.
pub fn check_invariants<'a>(
    products: impl IntoIterator<Item = &'a Product>,
) -> Vec<InvariantBreach> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut breaches = Vec::new();
    let mut featured = Vec::new();

    for product in products {
        if !seen.insert(product.id) && reported.insert(product.id) {
            breaches.push(InvariantBreach::DuplicateId(product.id));
        }
        if product.featured {
            featured.push(product.id);
        }
    }
    if featured.len() > 1 {
        breaches.push(InvariantBreach::MultipleFeatured(featured));
    }
    breaches
}
