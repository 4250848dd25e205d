//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use catalogdb_codec::{DESCRIPTION_MAX_LEN, NAME_MAX_LEN, QUANTITY_MAX};
use catalogdb_core::{Price, Product, ProductId};
use proptest::prelude::*;

/// Strategy for free text of 1 to `max_len` characters.
///
/// The text always starts with a letter and may contain commas, quotes and
/// line breaks, the characters that need quoting on disk.
pub fn text_strategy(max_len: usize) -> impl Strategy<Value = String> {
    let tail = format!("[a-zA-Z0-9 ,\"\n\r.'éñ-]{{0,{}}}", max_len.saturating_sub(1));
    (
        "[a-zA-Z]",
        prop::string::string_regex(&tail).expect("Invalid regex"),
    )
        .prop_map(|(head, tail)| format!("{head}{tail}"))
}

/// Strategy for valid product names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    text_strategy(NAME_MAX_LEN)
}

/// Strategy for valid product descriptions.
pub fn description_strategy() -> impl Strategy<Value = String> {
    text_strategy(DESCRIPTION_MAX_LEN)
}

/// Strategy for prices up to one million.
pub fn price_strategy() -> impl Strategy<Value = Price> {
    (0u64..=100_000_000).prop_map(Price::from_cents)
}

/// Strategy for image file names with an accepted extension.
pub fn image_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9_]{1,16}\\.(jpg|jpeg|png|gif|webp|JPG)")
        .expect("Invalid regex")
}

/// Strategy for valid, unstored, non-featured products.
pub fn product_strategy() -> impl Strategy<Value = Product> {
    (
        name_strategy(),
        description_strategy(),
        price_strategy(),
        0..=QUANTITY_MAX,
        image_strategy(),
    )
        .prop_map(|(name, description, price, quantity, image)| {
            Product::new(name, description, price, quantity, image)
        })
}

/// Strategy for valid stored products, possibly featured.
pub fn stored_product_strategy() -> impl Strategy<Value = Product> {
    (product_strategy(), 1u64..1_000_000, any::<bool>())
        .prop_map(|(product, id, featured)| {
            product.with_id(ProductId::new(id)).with_featured(featured)
        })
}

/// A repository call, with targets given as positions among the products
/// present when the action runs.
#[derive(Debug, Clone)]
pub enum RepoAction {
    /// Add a product.
    Add(Product),
    /// Replace the product at the position, keeping its id.
    Update(usize, Product),
    /// Delete the product at the position.
    Delete(usize),
    /// Feature the product at the position.
    SetFeatured(usize),
    /// Unfeature the product at the position.
    RemoveFeatured(usize),
}

/// Strategy for a single repository action.
pub fn action_strategy() -> impl Strategy<Value = RepoAction> {
    prop_oneof![
        3 => product_strategy().prop_map(RepoAction::Add),
        1 => (any::<usize>(), product_strategy())
            .prop_map(|(i, p)| RepoAction::Update(i, p)),
        1 => any::<usize>().prop_map(RepoAction::Delete),
        2 => any::<usize>().prop_map(RepoAction::SetFeatured),
        1 => any::<usize>().prop_map(RepoAction::RemoveFeatured),
    ]
}

/// Strategy for a sequence of repository actions.
pub fn action_sequence_strategy(max_len: usize) -> impl Strategy<Value = Vec<RepoAction>> {
    prop::collection::vec(action_strategy(), 1..=max_len)
}
