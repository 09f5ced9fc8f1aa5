//! Config-driven dataset definition.
//!
//! [`DatasetDefinition`] captures everything unique about one of the
//! street furniture datasets in a serializable config struct: where the
//! payload lives, how it is delimited, and which source columns feed each
//! logical field. Source headers vary between dataset revisions, so every
//! logical field lists its candidate column names in priority order.

use madrid_map_feature_models::FeatureCategory;
use madrid_map_source_models::{RawRow, RawValue};
use serde::Deserialize;

use crate::SchemaError;

// ── Top-level dataset definition ─────────────────────────────────────────

/// A complete, config-driven dataset definition.
///
/// Loaded from TOML files at compile time (see [`crate::registry`]).
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetDefinition {
    /// Unique identifier (e.g., `"traffic_lights"`).
    pub id: String,
    /// Human-readable name (e.g., `"Semáforos"`).
    pub name: String,
    /// Category every feature of this dataset belongs to.
    pub category: FeatureCategory,
    /// Resource name relative to the configured base location.
    pub resource: String,
    /// Field delimiter. Detected from the payload when omitted.
    #[serde(default)]
    pub delimiter: Option<String>,
    /// Whether the first line is a header row. Defaults to `true`.
    #[serde(default = "default_has_headers")]
    pub has_headers: bool,
    /// Optional URL to the human-readable open data portal page.
    #[serde(default)]
    pub portal_url: Option<String>,
    /// Field name mappings for normalization.
    pub fields: FieldMapping,
}

const fn default_has_headers() -> bool {
    true
}

impl DatasetDefinition {
    /// Returns the unique dataset identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable dataset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared delimiter byte, if any.
    #[must_use]
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter
            .as_deref()
            .and_then(|d| d.as_bytes().first().copied())
    }

    /// Checks that the payload header can satisfy the declared coordinate
    /// mapping. A dataset whose coordinates cannot be located is
    /// unloadable as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingColumn`] if no candidate column for a
    /// coordinate field is present.
    pub fn check_header(&self, header: &[String]) -> Result<(), SchemaError> {
        for (field, candidates) in self.fields.coordinates.required_columns() {
            let found = candidates.iter().any(|candidate| {
                header
                    .iter()
                    .any(|h| h == candidate || h.trim().eq_ignore_ascii_case(candidate.trim()))
            });
            if !found {
                return Err(SchemaError::MissingColumn {
                    field,
                    candidates: candidates.to_vec(),
                    header: header.to_vec(),
                });
            }
        }
        Ok(())
    }
}

// ── Field mapping ────────────────────────────────────────────────────────

/// Maps source-specific column names to logical feature fields.
///
/// Each list is tried in order; the first non-empty cell wins.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMapping {
    /// Where to find the coordinates.
    pub coordinates: CoordinateMapping,
    /// District name columns.
    #[serde(default)]
    pub district: Vec<String>,
    /// Neighborhood (barrio) columns. Only read for streetlights.
    #[serde(default)]
    pub neighborhood: Vec<String>,
    /// Identifier columns. Only read for traffic lights and acoustic
    /// signals.
    #[serde(default)]
    pub id: Vec<String>,
    /// Descriptive type columns.
    #[serde(default, rename = "type")]
    pub kind: Vec<String>,
    /// How to build the street address. Only read for streetlights.
    #[serde(default)]
    pub address: Option<AddressMapping>,
}

impl FieldMapping {
    /// Returns the raw district name of a row, if it is present as text.
    ///
    /// Numeric cells are not names and are not returned.
    #[must_use]
    pub fn district_name<'a>(&self, row: &'a RawRow) -> Option<&'a str> {
        row.first_present(&self.district)
            .and_then(RawValue::as_text)
    }
}

/// Declared location of the coordinate pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinateMapping {
    /// Longitude and latitude live in separate columns.
    Columns {
        /// Longitude column candidates.
        longitude: Vec<String>,
        /// Latitude column candidates.
        latitude: Vec<String>,
    },
    /// Both values live in one column, e.g. `"-3.7038, 40.4168"`.
    Pair {
        /// Column candidates.
        field: Vec<String>,
        /// Which value comes first in the cell.
        order: CoordinateOrder,
        /// Separator between the two values (default `","`).
        #[serde(default = "default_pair_separator")]
        separator: String,
    },
}

fn default_pair_separator() -> String {
    ",".to_string()
}

impl CoordinateMapping {
    /// The `(logical field, candidates)` pairs a header must satisfy.
    #[must_use]
    pub fn required_columns(&self) -> Vec<(&'static str, &[String])> {
        match self {
            Self::Columns {
                longitude,
                latitude,
            } => vec![
                ("longitude", longitude.as_slice()),
                ("latitude", latitude.as_slice()),
            ],
            Self::Pair { field, .. } => vec![("coordinates", field.as_slice())],
        }
    }
}

/// Order of the two values inside a combined coordinate cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateOrder {
    /// `"<longitude><sep><latitude>"` (canonical convention).
    LongitudeFirst,
    /// `"<latitude><sep><longitude>"`.
    LatitudeFirst,
}

/// How to extract the street address from a row.
///
/// Supports either a bare list of column names (first non-empty wins) or a
/// tagged struct for combining multiple columns.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AddressMapping {
    /// Candidate columns (`address = ["DIRECCION"]`).
    Fields(Vec<String>),
    /// Combine multiple columns with a separator.
    ///
    /// In TOML:
    /// ```toml
    /// [fields.address]
    /// type = "combine"
    /// fields = ["TIPO_VIA", "CALLE", "NUMERO"]
    /// separator = " "
    /// ```
    Tagged(AddressTagged),
}

/// Tagged variants for structured address extraction.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AddressTagged {
    /// Combine multiple columns with a separator (skip empty cells).
    Combine {
        /// Column names to combine.
        fields: Vec<String>,
        /// Separator between non-empty values.
        separator: String,
    },
}

impl AddressMapping {
    /// Extracts an address string from a row.
    #[must_use]
    pub fn extract(&self, row: &RawRow) -> Option<String> {
        match self {
            Self::Fields(fields) => row
                .first_present(fields)
                .and_then(RawValue::as_display)
                .map(String::from),
            Self::Tagged(AddressTagged::Combine { fields, separator }) => {
                let parts: Vec<&str> = fields
                    .iter()
                    .filter_map(|f| row.get(f))
                    .filter_map(RawValue::as_display)
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(separator))
                }
            }
        }
    }
}

/// Parses a [`DatasetDefinition`] from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or missing required fields.
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetDefinition, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}
