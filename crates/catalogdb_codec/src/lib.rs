//! # CatalogDB Codec
//!
//! The product record model and its line encoding.
//!
//! This crate provides:
//! - [`Product`], [`ProductId`] and the fixed-point [`Price`]
//! - The field rules ([`validate`], [`validate_new`])
//! - CSV-style line encoding ([`serialize`], [`deserialize`])
//! - Reassembly of records that span several physical lines
//!   ([`split_records`])
//!
//! ## Encoding Rules
//!
//! - Seven fields, always in the order of [`Field::ALL`]
//! - Fields holding `,`, `"` or a line break are quoted, inner quotes doubled
//! - Prices are written with two decimals and a `.` decimal point
//! - `featured` is written as `true`/`false`, but read leniently
//!
//! ## Usage
//!
//! ```
//! use catalogdb_codec::{deserialize, serialize, Price, Product, ProductId};
//!
//! let product = Product::new("Widget", "A simple, small widget", Price::from_cents(999), 5, "widget.jpg")
//!     .with_id(ProductId::new(1));
//!
//! let line = serialize(&product);
//! assert_eq!(line, "1,Widget,\"A simple, small widget\",9.99,5,widget.jpg,false");
//!
//! let decoded = deserialize(&line, 1).unwrap();
//! assert_eq!(decoded, product);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod error;
mod price;
mod product;
mod reader;
mod validate;

pub use codec::{
    deserialize, parse_featured, serialize, tokenize, FIELD_COUNT, HEADER_PREFIX, QUOTE, SEPARATOR,
};
pub use error::{CodecError, CodecResult, PriceError, Violation};
pub use price::Price;
pub use product::{Field, Product, ProductId};
pub use reader::{split_records, RawRecord};
pub use validate::{
    has_accepted_image_extension, validate, validate_new, DESCRIPTION_MAX_LEN, IMAGE_EXTENSIONS,
    NAME_MAX_LEN, QUANTITY_MAX,
};

/// Types that encode to a single record line.
pub trait EncodeLine {
    /// Encodes this value as a record line.
    fn encode_line(&self) -> String;
}

/// Types that decode from a single record line.
pub trait DecodeLine: Sized {
    /// Decodes a value from a record line starting on `line_number`.
    fn decode_line(line: &str, line_number: usize) -> CodecResult<Self>;
}

impl EncodeLine for Product {
    fn encode_line(&self) -> String {
        serialize(self)
    }
}

impl DecodeLine for Product {
    fn decode_line(line: &str, line_number: usize) -> CodecResult<Self> {
        deserialize(line, line_number)
    }
}
