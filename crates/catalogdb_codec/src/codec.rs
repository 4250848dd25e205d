//! Line encoding of product records.
//!
//! A record is seven comma-separated fields:
//!
//! ```text
//! id,name,description,price,quantity,image,featured
//! 1,Widget,"A widget, with ""quotes""",9.99,5,widget.jpg,false
//! ```
//!
//! A field containing a comma, a double quote or a line break is written
//! inside double quotes with every inner quote doubled. Prices are written
//! with two decimals and `.` as the decimal point; `featured` is written as
//! `true` or `false`.

use crate::error::{CodecError, CodecResult};
use crate::price::Price;
use crate::product::{Field, Product, ProductId};
use crate::validate::{check_quantity, check_text, DESCRIPTION_MAX_LEN, NAME_MAX_LEN};
use std::borrow::Cow;

/// Field separator.
pub const SEPARATOR: char = ',';
/// Quote character.
pub const QUOTE: char = '"';
/// Number of fields in a record.
pub const FIELD_COUNT: usize = 7;
/// Prefix identifying an optional header line.
pub const HEADER_PREFIX: &str = "Id,";

/// Encodes a product as one record line.
#[must_use]
pub fn serialize(product: &Product) -> String {
    let fields: [Cow<'_, str>; FIELD_COUNT] = [
        Cow::Owned(product.id.to_string()),
        escape(&product.name),
        escape(&product.description),
        Cow::Owned(product.price.to_string()),
        Cow::Owned(product.quantity.to_string()),
        escape(&product.image),
        Cow::Borrowed(if product.featured { "true" } else { "false" }),
    ];
    fields.join(",")
}

/// Decodes one record line.
///
/// `line_number` is only used for error reporting.
///
/// # Errors
///
/// Returns a [`CodecError`] naming the line and, where it applies, the
/// failing field.
pub fn deserialize(line: &str, line_number: usize) -> CodecResult<Product> {
    let fields = tokenize(line, line_number)?;
    if fields.len() != FIELD_COUNT {
        return Err(CodecError::FieldCount {
            line: line_number,
            expected: FIELD_COUNT,
            actual: fields.len(),
        });
    }

    let mut fields = fields.into_iter();
    let mut next = || fields.next().unwrap_or_default();

    let id = parse_id(&next(), line_number)?;
    let name = parse_text(next(), Field::Name, NAME_MAX_LEN, line_number)?;
    let description = parse_text(next(), Field::Description, DESCRIPTION_MAX_LEN, line_number)?;
    let price = next()
        .parse::<Price>()
        .map_err(|e| CodecError::invalid_field(line_number, Field::Price, e.to_string()))?;
    let quantity = parse_quantity(&next(), line_number)?;
    let image = next();
    let featured_token = next();
    let featured = parse_featured(&featured_token).ok_or_else(|| {
        CodecError::invalid_field(
            line_number,
            Field::Featured,
            format!("unrecognized boolean {featured_token:?}"),
        )
    })?;

    Ok(Product {
        id,
        name,
        description,
        price,
        quantity,
        image,
        featured,
    })
}

/// Splits a record line into raw field values.
///
/// A quote opens a quoted span and the next unpaired quote closes it. Inside
/// a span, `""` is a literal quote and separators and line breaks are plain
/// text. Outside a span, a separator ends the field.
///
/// # Errors
///
/// Returns [`CodecError::UnterminatedQuote`] if a span is still open at the
/// end of the line.
pub fn tokenize(line: &str, line_number: usize) -> CodecResult<Vec<String>> {
    let mut fields = Vec::with_capacity(FIELD_COUNT);
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            QUOTE if in_quotes => {
                if chars.peek() == Some(&QUOTE) {
                    chars.next();
                    current.push(QUOTE);
                } else {
                    in_quotes = false;
                }
            }
            QUOTE => in_quotes = true,
            SEPARATOR if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(CodecError::UnterminatedQuote { line: line_number });
    }
    fields.push(current);
    Ok(fields)
}

/// Parses a stored `featured` value.
///
/// Older files were written by hand and by other tools, so reads accept
/// `true/false`, `1/0`, `yes/no`, `y/n`, `on/off` and the Spanish
/// `si/sí/verdadero/falso`, in any case. Writes always use `true`/`false`.
#[must_use]
pub fn parse_featured(token: &str) -> Option<bool> {
    match token.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" | "si" | "sí" | "verdadero" => Some(true),
        "false" | "0" | "no" | "n" | "off" | "falso" => Some(false),
        _ => None,
    }
}

fn escape(value: &str) -> Cow<'_, str> {
    if value.contains([SEPARATOR, QUOTE, '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn parse_id(token: &str, line: usize) -> CodecResult<ProductId> {
    match token.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(ProductId::new(id)),
        _ => Err(CodecError::invalid_field(
            line,
            Field::Id,
            format!("expected a positive integer, got {token:?}"),
        )),
    }
}

fn parse_text(value: String, field: Field, max_len: usize, line: usize) -> CodecResult<String> {
    match check_text(field, &value, max_len) {
        Some(violation) => Err(CodecError::invalid_field(line, field, violation.message)),
        None => Ok(value),
    }
}

fn parse_quantity(token: &str, line: usize) -> CodecResult<u32> {
    let quantity = token.trim().parse::<u32>().map_err(|_| {
        CodecError::invalid_field(
            line,
            Field::Quantity,
            format!("expected a whole number, got {token:?}"),
        )
    })?;
    match check_quantity(quantity) {
        Some(violation) => Err(CodecError::invalid_field(
            line,
            Field::Quantity,
            violation.message,
        )),
        None => Ok(quantity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn widget() -> Product {
        Product::new("Widget", "A simple widget", Price::from_cents(999), 5, "widget.jpg")
            .with_id(ProductId::new(1))
    }

    fn field_of(result: CodecResult<Product>) -> Option<Field> {
        result.expect_err("expected a decode error").field()
    }

    #[test]
    fn serialize_plain_record() {
        assert_eq!(
            serialize(&widget()),
            "1,Widget,A simple widget,9.99,5,widget.jpg,false"
        );
    }

    #[test]
    fn serialize_pads_price_and_lowercases_flag() {
        let mut product = widget().with_featured(true);
        product.price = Price::from_cents(1000);
        assert_eq!(
            serialize(&product),
            "1,Widget,A simple widget,10.00,5,widget.jpg,true"
        );
    }

    #[test]
    fn serialize_quotes_special_fields() {
        let mut product = widget();
        product.name = "Nuts, bolts".to_string();
        product.description = "The \"best\" one\nsecond line".to_string();

        assert_eq!(
            serialize(&product),
            "1,\"Nuts, bolts\",\"The \"\"best\"\" one\nsecond line\",9.99,5,widget.jpg,false"
        );
    }

    #[test]
    fn deserialize_plain_record() {
        let product = deserialize("1,Widget,A simple widget,9.99,5,widget.jpg,false", 1).unwrap();
        assert_eq!(product, widget());
    }

    #[test]
    fn deserialize_quoted_fields() {
        let line = "2,\"Nuts, bolts\",\"Say \"\"hi\"\"\",1.50,0,nuts.png,true";
        let product = deserialize(line, 4).unwrap();

        assert_eq!(product.name, "Nuts, bolts");
        assert_eq!(product.description, "Say \"hi\"");
        assert_eq!(product.price.cents(), 150);
        assert!(product.featured);
    }

    #[test]
    fn deserialize_requires_seven_fields() {
        let err = deserialize("1,Widget,A simple widget,9.99,5,widget.jpg", 3).unwrap_err();
        assert_eq!(
            err,
            CodecError::FieldCount {
                line: 3,
                expected: 7,
                actual: 6
            }
        );
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn deserialize_reports_failing_field() {
        let base = ["1", "Widget", "A simple widget", "9.99", "5", "widget.jpg", "false"];
        let cases: [(usize, &str, Field); 9] = [
            (0, "0", Field::Id),
            (0, "-4", Field::Id),
            (0, "x", Field::Id),
            (1, "  ", Field::Name),
            (2, "", Field::Description),
            (3, "1.234", Field::Price),
            (3, "-1", Field::Price),
            (4, "151", Field::Quantity),
            (6, "maybe", Field::Featured),
        ];

        for (index, value, expected) in cases {
            let mut fields = base;
            fields[index] = value;
            let line = fields.join(",");
            assert_eq!(field_of(deserialize(&line, 9)), Some(expected), "{line}");
        }
    }

    #[test]
    fn deserialize_rejects_long_name() {
        let line = format!("1,{},desc,1.00,1,a.jpg,false", "n".repeat(NAME_MAX_LEN + 1));
        assert_eq!(field_of(deserialize(&line, 1)), Some(Field::Name));
    }

    #[test]
    fn deserialize_unterminated_quote() {
        let err = deserialize("1,\"Widget,desc,1.00,1,a.jpg,false", 7).unwrap_err();
        assert_eq!(err, CodecError::UnterminatedQuote { line: 7 });
    }

    #[test]
    fn featured_accepts_fuzzy_tokens() {
        for token in ["true", "TRUE", "1", "yes", "Y", "on", "si", "Sí", "verdadero"] {
            assert_eq!(parse_featured(token), Some(true), "{token}");
        }
        for token in ["false", "0", "No", "n", "OFF", "falso", " false "] {
            assert_eq!(parse_featured(token), Some(false), "{token}");
        }
        assert_eq!(parse_featured(""), None);
        assert_eq!(parse_featured("2"), None);
    }

    #[test]
    fn tokenize_handles_empty_fields() {
        assert_eq!(tokenize(",,", 1).unwrap(), vec!["", "", ""]);
        assert_eq!(tokenize("\"\"", 1).unwrap(), vec![""]);
    }

    fn text_strategy(max_tail: usize) -> impl Strategy<Value = String> {
        let tail = format!("[a-zA-Z0-9 ,\"\n\r.'-]{{0,{max_tail}}}");
        ("[a-zA-Z]", proptest::string::string_regex(&tail).unwrap())
            .prop_map(|(head, tail)| format!("{head}{tail}"))
    }

    fn product_strategy() -> impl Strategy<Value = Product> {
        (
            1u64..1_000_000,
            text_strategy(NAME_MAX_LEN - 1),
            text_strategy(DESCRIPTION_MAX_LEN - 1),
            0u64..100_000_000,
            0u32..=150,
            "[a-z]{1,12}\\.(jpg|png|gif)",
            any::<bool>(),
        )
            .prop_map(
                |(id, name, description, cents, quantity, image, featured)| Product {
                    id: ProductId::new(id),
                    name,
                    description,
                    price: Price::from_cents(cents),
                    quantity,
                    image,
                    featured,
                },
            )
    }

    proptest! {
        #[test]
        fn round_trip_preserves_every_field(product in product_strategy()) {
            let line = serialize(&product);
            let decoded = deserialize(&line, 1).unwrap();
            prop_assert_eq!(&decoded, &product);
            prop_assert_eq!(serialize(&decoded), line);
        }
    }
}
