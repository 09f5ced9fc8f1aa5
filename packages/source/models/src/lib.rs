#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Raw row types produced by the tabular parser and the taxonomy of
//! row-level rejections.
//!
//! A [`RawRow`] is ephemeral: it lives only long enough to be validated
//! and turned into a feature (or discarded with a [`RowRejection`]).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A single cell value after best-effort type coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Blank cell (empty or whitespace only).
    Empty,
    /// Numeric-looking cell. The trimmed source text is kept so that
    /// identifiers such as `"00123"` can be shown as written.
    Number {
        /// Parsed value.
        value: f64,
        /// Trimmed source text.
        text: String,
    },
    /// Any other cell, trimmed.
    Text(String),
}

impl RawValue {
    /// Coerces a raw cell: blank cells become [`RawValue::Empty`],
    /// numeric-looking cells become [`RawValue::Number`], everything else
    /// stays text.
    #[must_use]
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        if looks_numeric(trimmed)
            && let Ok(value) = trimmed.parse::<f64>()
            && value.is_finite()
        {
            return Self::Number {
                value,
                text: trimmed.to_string(),
            };
        }
        Self::Text(trimmed.to_string())
    }

    /// Returns `true` for blank cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the cell as text, but only if it was not coerced to a number.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Empty | Self::Number { .. } => None,
        }
    }

    /// Returns the cell's source text regardless of its coerced type.
    #[must_use]
    pub fn as_display(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Number { text: s, .. } => Some(s),
            Self::Empty => None,
        }
    }

    /// Returns the numeric value, if the cell was coerced to a number.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number { value, .. } => Some(*value),
            Self::Empty | Self::Text(_) => None,
        }
    }
}

/// Only plain decimal notation counts as numeric. Rejects `"inf"`,
/// `"NaN"` and friends, which `f64::from_str` would otherwise accept.
fn looks_numeric(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_digit())
        && s
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'))
}

/// One data line of a dataset, keyed by column name.
///
/// Column names are shared between all rows of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    line: u64,
    columns: Arc<[String]>,
    values: Vec<RawValue>,
}

impl RawRow {
    /// Creates a row. Missing trailing cells read as [`RawValue::Empty`];
    /// surplus cells without a column name are unreachable by name.
    #[must_use]
    pub const fn new(line: u64, columns: Arc<[String]>, values: Vec<RawValue>) -> Self {
        Self {
            line,
            columns,
            values,
        }
    }

    /// 1-based line number in the source text.
    #[must_use]
    pub const fn line(&self) -> u64 {
        self.line
    }

    /// Looks up a cell by column name.
    ///
    /// Exact matches win; otherwise the first column whose trimmed name
    /// matches case-insensitively is used. A known column with no cell
    /// reads as [`RawValue::Empty`].
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RawValue> {
        let index = self
            .columns
            .iter()
            .position(|c| c == column)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.trim().eq_ignore_ascii_case(column.trim()))
            })?;
        Some(self.values.get(index).unwrap_or(&RawValue::Empty))
    }

    /// Tries each candidate column in order and returns the first
    /// non-empty cell.
    #[must_use]
    pub fn first_present<S: AsRef<str>>(&self, candidates: &[S]) -> Option<&RawValue> {
        candidates
            .iter()
            .filter_map(|c| self.get(c.as_ref()))
            .find(|v| !v.is_empty())
    }

    /// Returns `true` when every cell is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(RawValue::is_empty)
    }

    /// Iterates `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// Classification of a row-level rejection, used for tallying.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionKind {
    /// A coordinate cell was absent or blank.
    MissingCoordinate,
    /// A coordinate cell could not be read as a number.
    MalformedCoordinate,
    /// The coordinates fall outside the Madrid bounding box.
    OutOfRegion,
    /// The line itself could not be read.
    MalformedRow,
}

impl RejectionKind {
    /// Whether this rejection came from coordinate validation.
    #[must_use]
    pub const fn is_coordinate(self) -> bool {
        matches!(
            self,
            Self::MissingCoordinate | Self::MalformedCoordinate | Self::OutOfRegion
        )
    }
}

/// Why a row was discarded. Row rejections are recoverable: the row is
/// skipped and counted, the dataset keeps loading.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowRejection {
    /// A coordinate cell was absent or blank.
    #[error("missing coordinate: {field}")]
    MissingCoordinate {
        /// Logical field that was missing (`longitude` / `latitude`).
        field: &'static str,
    },

    /// A coordinate cell could not be read as a number.
    #[error("malformed coordinate {field}: {value:?}")]
    MalformedCoordinate {
        /// Logical field that was malformed.
        field: &'static str,
        /// The offending cell text.
        value: String,
    },

    /// The coordinates fall outside the accepted region.
    #[error("coordinates out of region: ({longitude}, {latitude})")]
    OutOfRegion {
        /// Parsed longitude.
        longitude: f64,
        /// Parsed latitude.
        latitude: f64,
    },

    /// The line could not be read at all.
    #[error("malformed row at line {line}: {message}")]
    MalformedRow {
        /// 1-based line number.
        line: u64,
        /// Parser message.
        message: String,
    },
}

impl RowRejection {
    /// The tally bucket this rejection belongs to.
    #[must_use]
    pub const fn kind(&self) -> RejectionKind {
        match self {
            Self::MissingCoordinate { .. } => RejectionKind::MissingCoordinate,
            Self::MalformedCoordinate { .. } => RejectionKind::MalformedCoordinate,
            Self::OutOfRegion { .. } => RejectionKind::OutOfRegion,
            Self::MalformedRow { .. } => RejectionKind::MalformedRow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(columns: &[&str], cells: &[&str]) -> RawRow {
        let columns: Arc<[String]> = columns.iter().map(|c| (*c).to_string()).collect();
        RawRow::new(2, columns, cells.iter().map(|c| RawValue::coerce(c)).collect())
    }

    #[test]
    fn coerces_numbers_text_and_blanks() {
        assert_eq!(RawValue::coerce("  "), RawValue::Empty);
        assert_eq!(RawValue::coerce("-3.70").as_f64(), Some(-3.70));
        assert_eq!(RawValue::coerce("Centro").as_text(), Some("Centro"));
    }

    #[test]
    fn comma_decimals_stay_text() {
        let value = RawValue::coerce("-3,7038");
        assert_eq!(value.as_text(), Some("-3,7038"));
        assert!(value.as_f64().is_none());
    }

    #[test]
    fn special_float_words_are_not_numbers() {
        assert!(RawValue::coerce("inf").as_text().is_some());
        assert!(RawValue::coerce("NaN").as_text().is_some());
    }

    #[test]
    fn numbers_keep_source_text() {
        assert_eq!(RawValue::coerce("00123").as_display(), Some("00123"));
    }

    #[test]
    fn looks_up_columns_case_insensitively() {
        let row = row(&["LONGITUD", "Distrito "], &["-3.7", "Centro"]);
        assert_eq!(row.get("longitud").and_then(RawValue::as_f64), Some(-3.7));
        assert_eq!(row.get("DISTRITO").and_then(RawValue::as_text), Some("Centro"));
        assert!(row.get("BARRIO").is_none());
    }

    #[test]
    fn short_rows_read_blank_cells() {
        let row = row(&["A", "B"], &["1"]);
        assert_eq!(row.get("B"), Some(&RawValue::Empty));
    }

    #[test]
    fn first_present_skips_blank_candidates() {
        let row = row(&["TIPO", "TIPO_ELEM"], &["", "LED"]);
        assert_eq!(
            row.first_present(&["TIPO", "TIPO_ELEM"])
                .and_then(RawValue::as_text),
            Some("LED")
        );
    }

    #[test]
    fn rejection_kinds_classify_coordinates() {
        let rejection = RowRejection::OutOfRegion {
            longitude: -3.0,
            latitude: 40.4,
        };
        assert_eq!(rejection.kind(), RejectionKind::OutOfRegion);
        assert!(rejection.kind().is_coordinate());
        assert!(!RejectionKind::MalformedRow.is_coordinate());
    }
}
