//! Splitting file contents into records.

use crate::codec::{deserialize, HEADER_PREFIX, QUOTE};
use crate::error::{CodecError, CodecResult};
use crate::product::Product;

const QUOTE_BYTE: u8 = QUOTE as u8;

/// The raw bytes of one record and the line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based physical line number of the first line of the record.
    pub line: usize,
    /// Record bytes without the trailing line terminator.
    pub bytes: Vec<u8>,
}

impl RawRecord {
    fn new(line: usize, mut bytes: Vec<u8>) -> Self {
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        Self { line, bytes }
    }

    /// Returns the record as text.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotText`] if the bytes are not valid UTF-8.
    pub fn text(&self) -> CodecResult<&str> {
        std::str::from_utf8(&self.bytes).map_err(|_| CodecError::NotText { line: self.line })
    }

    /// Decodes the record.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the record is not text or does not decode.
    pub fn decode(&self) -> CodecResult<Product> {
        deserialize(self.text()?, self.line)
    }
}

/// Splits file contents into records.
///
/// A line break inside an open quoted span belongs to the field, so a record
/// may cover several physical lines. Such a record is only accepted if it
/// decodes; otherwise its first physical line becomes a record of its own
/// and splitting resumes on the next line. A stray quote therefore damages
/// one line, not everything after it.
///
/// Blank lines between records are skipped, and so is a leading header line
/// starting with `Id,`. Lines are not required to be UTF-8; see
/// [`RawRecord::text`].
#[must_use]
pub fn split_records(contents: impl AsRef<[u8]>) -> Vec<RawRecord> {
    let lines: Vec<&[u8]> = contents.as_ref().split(|&b| b == b'\n').collect();
    let mut records = Vec::new();
    let mut seen_first = false;
    let mut next = 0;

    while next < lines.len() {
        let start = next;
        next += 1;

        let first = lines[start];
        if is_blank(first) {
            continue;
        }
        if !seen_first {
            seen_first = true;
            if first.starts_with(HEADER_PREFIX.as_bytes()) {
                continue;
            }
        }

        if opens_quote(first) {
            if let Some((end, record)) = join_quoted(&lines, start) {
                next = end + 1;
                records.push(record);
                continue;
            }
        }
        records.push(RawRecord::new(start + 1, first.to_vec()));
    }

    records
}

/// Joins the lines from `start` up to the one closing its quoted span,
/// returning the index of that line and the record if it decodes.
fn join_quoted(lines: &[&[u8]], start: usize) -> Option<(usize, RawRecord)> {
    let mut end = start;
    let mut open = true;
    while open {
        end += 1;
        open ^= opens_quote(lines.get(end)?);
    }

    let record = RawRecord::new(start + 1, lines[start..=end].join(&b'\n'));
    record.decode().ok().map(|_| (end, record))
}

/// True if the line holds an odd number of quotes.
fn opens_quote(line: &[u8]) -> bool {
    line.iter().filter(|&&b| b == QUOTE_BYTE).count() % 2 == 1
}

fn is_blank(line: &[u8]) -> bool {
    std::str::from_utf8(line).is_ok_and(|text| text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::serialize;
    use crate::{Price, Product, ProductId};

    fn texts(records: &[RawRecord]) -> Vec<(usize, &str)> {
        records.iter().map(|r| (r.line, r.text().unwrap())).collect()
    }

    #[test]
    fn one_record_per_line() {
        let records = split_records("1,a\n2,b\n3,c\n");
        assert_eq!(texts(&records), vec![(1, "1,a"), (2, "2,b"), (3, "3,c")]);
    }

    #[test]
    fn skips_blank_lines_and_keeps_numbers() {
        let records = split_records("\n1,a\n\n   \n2,b");
        assert_eq!(texts(&records), vec![(2, "1,a"), (5, "2,b")]);
    }

    #[test]
    fn skips_header() {
        let records = split_records("Id,Name,Description,Price,Quantity,Image,Featured\n1,a\n");
        assert_eq!(texts(&records), vec![(2, "1,a")]);
    }

    #[test]
    fn header_only_skipped_at_start() {
        let records = split_records("1,a\nId,b\n");
        assert_eq!(texts(&records), vec![(1, "1,a"), (2, "Id,b")]);
    }

    #[test]
    fn strips_crlf() {
        let records = split_records("1,a\r\n2,b\r\n");
        assert_eq!(texts(&records), vec![(1, "1,a"), (2, "2,b")]);
    }

    #[test]
    fn quoted_line_break_continues_record() {
        let records = split_records(
            "1,\"two\n\nlines\",d,1.00,1,a.jpg,false\n2,B,b,1.00,1,b.jpg,false\n",
        );
        assert_eq!(
            texts(&records),
            vec![
                (1, "1,\"two\n\nlines\",d,1.00,1,a.jpg,false"),
                (4, "2,B,b,1.00,1,b.jpg,false"),
            ]
        );
    }

    #[test]
    fn stray_quote_damages_only_its_line() {
        let text = "1,Widget,A widget,9.99,5,widget.jpg,false\n\
                    2,5\" Screen,A screen,99.00,1,screen.png,false\n\
                    3,Lamp,A lamp,12.50,4,lamp.png,false\n\
                    4,Rug,A rug,40.00,2,rug.jpg,false\n";
        let records = split_records(text);

        let lines: Vec<usize> = records.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
        assert!(matches!(
            records[1].decode(),
            Err(CodecError::UnterminatedQuote { line: 2 })
        ));
        assert_eq!(records[2].decode().unwrap().id, ProductId::new(3));
        assert_eq!(records[3].decode().unwrap().id, ProductId::new(4));
    }

    #[test]
    fn unclosed_quote_on_last_line() {
        let records = split_records("1,\"open\n");
        assert_eq!(texts(&records), vec![(1, "1,\"open")]);
    }

    #[test]
    fn two_stray_quotes_do_not_pair_up() {
        let records = split_records("1,a\"b,c\n2,d\"e,f\n");
        assert_eq!(texts(&records), vec![(1, "1,a\"b,c"), (2, "2,d\"e,f")]);
    }

    #[test]
    fn bad_utf8_stays_on_its_line() {
        let records = split_records(b"1,Caf\xe9,x\n2,ok\n".as_slice());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bytes, b"1,Caf\xe9,x");
        assert_eq!(records[0].text(), Err(CodecError::NotText { line: 1 }));
        assert_eq!(records[1].text().unwrap(), "2,ok");
    }

    #[test]
    fn multiline_products_survive_file_round_trip() {
        let mut first = Product::new("Lamp", "Line one\r\nLine two", Price::from_cents(100), 1, "l.png")
            .with_id(ProductId::new(1));
        first.name = "Lamp, \"deluxe\"".to_string();
        let second = Product::new("Rug", "Plain", Price::from_cents(200), 2, "r.jpg")
            .with_id(ProductId::new(2));

        let text = format!("{}\n{}\n", serialize(&first), serialize(&second));
        let decoded: Vec<Product> = split_records(&text)
            .iter()
            .map(|r| r.decode().unwrap())
            .collect();

        assert_eq!(decoded, vec![first, second]);
    }
}
