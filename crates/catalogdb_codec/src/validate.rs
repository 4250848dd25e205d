//! Field rules shared by decoding, direct writes and commit validation.

use crate::error::Violation;
use crate::product::{Field, Product};

/// Maximum name length, in characters.
pub const NAME_MAX_LEN: usize = 100;
/// Maximum description length, in characters.
pub const DESCRIPTION_MAX_LEN: usize = 250;
/// Largest allowed stock quantity.
pub const QUANTITY_MAX: u32 = 150;
/// Accepted image file extensions, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Checks every field rule, including a positive id.
///
/// All broken rules are reported, not just the first one.
#[must_use]
pub fn validate(product: &Product) -> Vec<Violation> {
    let mut violations = Vec::new();
    if !product.id.is_assigned() {
        violations.push(Violation::new(Field::Id, "must be a positive integer"));
    }
    violations.extend(validate_new(product));
    violations
}

/// Checks every field rule except the id.
///
/// Used for records that have not been given an id yet.
#[must_use]
pub fn validate_new(product: &Product) -> Vec<Violation> {
    let mut violations = Vec::new();

    violations.extend(check_text(Field::Name, &product.name, NAME_MAX_LEN));
    violations.extend(check_text(
        Field::Description,
        &product.description,
        DESCRIPTION_MAX_LEN,
    ));
    violations.extend(check_quantity(product.quantity));
    if !has_accepted_image_extension(&product.image) {
        violations.push(Violation::new(
            Field::Image,
            format!("must end in one of {}", IMAGE_EXTENSIONS.join(" ")),
        ));
    }

    violations
}

/// Returns true if `image` names a file with an accepted extension.
#[must_use]
pub fn has_accepted_image_extension(image: &str) -> bool {
    let lower = image.trim().to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.len() > ext.len() && lower.ends_with(ext))
}

pub(crate) fn check_text(field: Field, value: &str, max_len: usize) -> Option<Violation> {
    if value.trim().is_empty() {
        return Some(Violation::new(field, "is required"));
    }
    let len = value.chars().count();
    if len > max_len {
        return Some(Violation::new(
            field,
            format!("must be at most {max_len} characters, got {len}"),
        ));
    }
    None
}

pub(crate) fn check_quantity(quantity: u32) -> Option<Violation> {
    (quantity > QUANTITY_MAX).then(|| {
        Violation::new(
            Field::Quantity,
            format!("must be between 0 and {QUANTITY_MAX}, got {quantity}"),
        )
    })
}
