//! The product record.

use crate::error::Violation;
use crate::price::Price;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a product.
///
/// Ids are positive and unique within a store. They are assigned by the
/// repository; `ProductId::UNASSIGNED` marks a record that has not been
/// stored yet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl ProductId {
    /// Placeholder id of a record that has not been stored yet.
    pub const UNASSIGNED: Self = Self(0);

    /// Creates a product id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the id following this one, or `None` at `u64::MAX`.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Returns true for any id other than [`ProductId::UNASSIGNED`].
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The fields of a record, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// `id`
    Id,
    /// `name`
    Name,
    /// `description`
    Description,
    /// `price`
    Price,
    /// `quantity`
    Quantity,
    /// `image`
    Image,
    /// `featured`
    Featured,
}

impl Field {
    /// All fields in the order they are stored.
    pub const ALL: [Field; 7] = [
        Field::Id,
        Field::Name,
        Field::Description,
        Field::Price,
        Field::Quantity,
        Field::Image,
        Field::Featured,
    ];

    /// Returns the lowercase field name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Name => "name",
            Field::Description => "description",
            Field::Price => "price",
            Field::Quantity => "quantity",
            Field::Image => "image",
            Field::Featured => "featured",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique id, assigned by the repository.
    pub id: ProductId,
    /// Display name, 1 to 100 characters.
    pub name: String,
    /// Description, 1 to 250 characters.
    pub description: String,
    /// Unit price.
    pub price: Price,
    /// Units in stock, 0 to 150.
    pub quantity: u32,
    /// Image file name.
    pub image: String,
    /// Whether this is the highlighted product. At most one per store.
    pub featured: bool,
}

impl Product {
    /// Creates an unstored, non-featured product.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Price,
        quantity: u32,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: ProductId::UNASSIGNED,
            name: name.into(),
            description: description.into(),
            price,
            quantity,
            image: image.into(),
            featured: false,
        }
    }

    /// Returns the product with `id` set.
    #[must_use]
    pub fn with_id(mut self, id: ProductId) -> Self {
        self.id = id;
        self
    }

    /// Returns the product with the featured flag set to `featured`.
    #[must_use]
    pub fn with_featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }

    /// Checks the field rules, including a positive id.
    #[must_use]
    pub fn validate(&self) -> Vec<Violation> {
        crate::validate::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_is_unassigned() {
        let product = Product::new("Lamp", "A desk lamp", Price::from_cents(1250), 3, "lamp.png");
        assert_eq!(product.id, ProductId::UNASSIGNED);
        assert!(!product.id.is_assigned());
        assert!(!product.featured);
    }

    #[test]
    fn builders_set_fields() {
        let product = Product::new("Lamp", "A desk lamp", Price::ZERO, 0, "lamp.png")
            .with_id(ProductId::new(7))
            .with_featured(true);
        assert_eq!(product.id.as_u64(), 7);
        assert!(product.featured);
    }

    #[test]
    fn id_next_and_display() {
        let id = ProductId::new(41);
        assert_eq!(id.next(), Some(ProductId::new(42)));
        assert_eq!(ProductId::UNASSIGNED.next(), Some(ProductId::new(1)));
        assert_eq!(format!("{id}"), "41");
    }

    #[test]
    fn id_next_at_max_is_none() {
        assert_eq!(ProductId::new(u64::MAX).next(), None);
    }

    #[test]
    fn field_order_matches_storage() {
        let names: Vec<_> = Field::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            ["id", "name", "description", "price", "quantity", "image", "featured"]
        );
    }
}
