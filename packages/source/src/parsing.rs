//! Delimited-text parsing into [`RawRow`]s.
//!
//! The parser is lenient: ragged lines are accepted, invalid UTF-8 is
//! replaced, and a line the CSV reader cannot read at all becomes a
//! [`RowRejection::MalformedRow`] instead of failing the dataset. Only a
//! missing header row is fatal.

use std::sync::Arc;

use madrid_map_source_models::{RawRow, RawValue, RowRejection};

use crate::ParseError;
use crate::source_def::DatasetDefinition;

const BOM: char = '\u{feff}';

/// Tabular parser configured with a delimiter and header flag.
#[derive(Debug, Clone, Copy)]
pub struct RecordParser {
    delimiter: Option<u8>,
    has_headers: bool,
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordParser {
    /// Creates a parser that detects the delimiter and expects a header
    /// row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delimiter: None,
            has_headers: true,
        }
    }

    /// Creates a parser configured from a dataset definition.
    #[must_use]
    pub fn for_dataset(def: &DatasetDefinition) -> Self {
        Self {
            delimiter: def.delimiter_byte(),
            has_headers: def.has_headers,
        }
    }

    /// Sets an explicit field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Sets whether the first line is a header row.
    #[must_use]
    pub const fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Parses `text` into a lazy sequence of rows.
    ///
    /// Blank lines and lines whose every cell is blank are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingHeader`] if headers are expected but
    /// the text has none, or [`ParseError::Csv`] if the header line itself
    /// cannot be read.
    pub fn parse<'a>(&self, text: &'a str) -> Result<ParsedRows<'a>, ParseError> {
        let text = text.strip_prefix(BOM).unwrap_or(text);
        let delimiter = self.delimiter.unwrap_or_else(|| detect_delimiter(text));

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.has_headers)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut pending = None;
        let columns: Arc<[String]> = if self.has_headers {
            let headers: Vec<String> = reader
                .byte_headers()?
                .iter()
                .map(|h| String::from_utf8_lossy(h).trim().to_owned())
                .collect();
            if headers.iter().all(String::is_empty) {
                return Err(ParseError::MissingHeader);
            }
            headers.into()
        } else {
            let mut first = csv::ByteRecord::new();
            let width = if reader.read_byte_record(&mut first)? {
                let width = first.len();
                pending = Some(first);
                width
            } else {
                0
            };
            (0..width).map(|i| i.to_string()).collect()
        };

        Ok(ParsedRows {
            columns,
            pending,
            records: reader.into_byte_records(),
        })
    }
}

/// Lazy iterator over the rows of one payload.
pub struct ParsedRows<'a> {
    columns: Arc<[String]>,
    pending: Option<csv::ByteRecord>,
    records: csv::ByteRecordsIntoIter<&'a [u8]>,
}

impl ParsedRows<'_> {
    /// The header (or index-named columns for headerless payloads).
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn to_row(&self, record: &csv::ByteRecord) -> RawRow {
        let line = record.position().map_or(0, csv::Position::line);
        let values = record
            .iter()
            .map(|cell| RawValue::coerce(&String::from_utf8_lossy(cell)))
            .collect();
        RawRow::new(line, Arc::clone(&self.columns), values)
    }
}

impl Iterator for ParsedRows<'_> {
    type Item = Result<RawRow, RowRejection>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.pending.take() {
                Some(record) => record,
                None => match self.records.next()? {
                    Ok(record) => record,
                    Err(e) => {
                        let line = e.position().map_or(0, csv::Position::line);
                        return Some(Err(RowRejection::MalformedRow {
                            line,
                            message: e.to_string(),
                        }));
                    }
                },
            };
            let row = self.to_row(&record);
            if !row.is_blank() {
                return Some(Ok(row));
            }
        }
    }
}

/// Picks `;` when the first non-empty line has more semicolons than
/// commas, otherwise `,`.
#[must_use]
pub fn detect_delimiter(text: &str) -> u8 {
    let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let semicolons = first.matches(';').count();
    let commas = first.matches(',').count();
    if semicolons > commas { b';' } else { b',' }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(parser: RecordParser, text: &str) -> Vec<Result<RawRow, RowRejection>> {
        parser.parse(text).unwrap().collect()
    }

    #[test]
    fn parses_semicolon_rows_with_coercion() {
        let rows = collect(
            RecordParser::new().with_delimiter(b';'),
            "CODIGO;DISTRITO;LONGITUD\n00123;Centro;-3.70\n",
        );
        assert_eq!(rows.len(), 1);
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.line(), 2);
        assert_eq!(row.get("CODIGO").and_then(RawValue::as_display), Some("00123"));
        assert_eq!(row.get("DISTRITO").and_then(RawValue::as_text), Some("Centro"));
        assert_eq!(row.get("LONGITUD").and_then(RawValue::as_f64), Some(-3.70));
    }

    #[test]
    fn skips_blank_lines_and_blank_rows() {
        let rows = collect(
            RecordParser::new().with_delimiter(b';'),
            "A;B\n1;2\n\n;\n  ;  \n3;4\n",
        );
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(Result::is_ok));
    }

    #[test]
    fn strips_bom_and_trims_headers() {
        let parsed = RecordParser::new()
            .with_delimiter(b';')
            .parse("\u{feff} LONGITUD ;LATITUD\n-3.7;40.4\n")
            .unwrap();
        assert_eq!(parsed.columns(), ["LONGITUD", "LATITUD"]);
    }

    #[test]
    fn accepts_ragged_rows() {
        let rows = collect(RecordParser::new(), "A,B,C\n1,2\n1,2,3,4\n");
        assert_eq!(rows.len(), 2);
        let short = rows[0].as_ref().unwrap();
        assert_eq!(short.get("C"), Some(&RawValue::Empty));
    }

    #[test]
    fn replaces_invalid_utf8() {
        let bytes = b"A;B\nCarabanchel;\xff\n";
        let text = String::from_utf8_lossy(bytes);
        let rows = collect(RecordParser::new().with_delimiter(b';'), &text);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].as_ref().unwrap().get("B").unwrap().as_text().is_some());
    }

    #[test]
    fn names_headerless_columns_by_index() {
        let rows = collect(
            RecordParser::new().with_headers(false),
            "-3.70,40.42\n-3.71,40.43\n",
        );
        assert_eq!(rows.len(), 2);
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.get("0").and_then(RawValue::as_f64), Some(-3.70));
        assert_eq!(row.get("1").and_then(RawValue::as_f64), Some(40.42));
    }

    #[test]
    fn empty_payload_is_missing_header() {
        assert!(matches!(
            RecordParser::new().parse(""),
            Err(ParseError::MissingHeader)
        ));
        assert!(matches!(
            RecordParser::new().parse("\u{feff}"),
            Err(ParseError::MissingHeader)
        ));
    }

    #[test]
    fn headerless_empty_payload_yields_nothing() {
        let parsed = RecordParser::new().with_headers(false).parse("").unwrap();
        assert_eq!(parsed.count(), 0);
    }

    #[test]
    fn detects_delimiters() {
        assert_eq!(detect_delimiter("A;B;C\n1,5;2;3"), b';');
        assert_eq!(detect_delimiter("\nA,B\n"), b',');
        assert_eq!(detect_delimiter(""), b',');
    }

    #[test]
    fn uses_dataset_delimiter() {
        let def = crate::source_def::parse_dataset_toml(include_str!(
            "../datasets/traffic_lights.toml"
        ))
        .unwrap();
        let rows = collect(
            RecordParser::for_dataset(&def),
            "CODIGO;LONGITUD;LATITUD\nA1;-3,70;40,42\n",
        );
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.get("LONGITUD").and_then(RawValue::as_text), Some("-3,70"));
    }
}
