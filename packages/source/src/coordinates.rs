//! Coordinate extraction, repair and bounds validation.

use madrid_map_feature_models::Position;
use madrid_map_source_models::{RawRow, RawValue, RowRejection};

use crate::source_def::{CoordinateMapping, CoordinateOrder};

/// Inclusive longitude/latitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Western edge.
    pub min_longitude: f64,
    /// Eastern edge.
    pub max_longitude: f64,
    /// Southern edge.
    pub min_latitude: f64,
    /// Northern edge.
    pub max_latitude: f64,
}

impl BoundingBox {
    /// Whether the point lies inside the box (edges included).
    #[must_use]
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        (self.min_longitude..=self.max_longitude).contains(&longitude)
            && (self.min_latitude..=self.max_latitude).contains(&latitude)
    }
}

/// The accepted region around the municipality of Madrid.
pub const MADRID_BOUNDS: BoundingBox = BoundingBox {
    min_longitude: -4.35,
    max_longitude: -3.10,
    min_latitude: 40.15,
    max_latitude: 40.65,
};

/// Extracts, parses and bounds-checks the coordinate pair of a row.
///
/// # Errors
///
/// * [`RowRejection::MissingCoordinate`] if either value is absent or blank
/// * [`RowRejection::MalformedCoordinate`] if a value is not a finite
///   number, even after swapping a decimal comma for a period
/// * [`RowRejection::OutOfRegion`] if the point falls outside `bounds`
pub fn validate_coordinates(
    row: &RawRow,
    mapping: &CoordinateMapping,
    bounds: &BoundingBox,
) -> Result<Position, RowRejection> {
    let (longitude, latitude) = match mapping {
        CoordinateMapping::Columns {
            longitude,
            latitude,
        } => {
            let lng = row
                .first_present(longitude)
                .ok_or(RowRejection::MissingCoordinate { field: "longitude" })?;
            let lat = row
                .first_present(latitude)
                .ok_or(RowRejection::MissingCoordinate { field: "latitude" })?;
            (
                value_to_f64(lng, "longitude")?,
                value_to_f64(lat, "latitude")?,
            )
        }
        CoordinateMapping::Pair {
            field,
            order,
            separator,
        } => {
            let cell = row
                .first_present(field)
                .and_then(RawValue::as_display)
                .ok_or(RowRejection::MissingCoordinate {
                    field: "coordinates",
                })?;
            split_pair(cell, *order, separator)?
        }
    };

    if !bounds.contains(longitude, latitude) {
        return Err(RowRejection::OutOfRegion {
            longitude,
            latitude,
        });
    }

    Ok(Position::new(longitude, latitude))
}

fn value_to_f64(value: &RawValue, field: &'static str) -> Result<f64, RowRejection> {
    if let Some(v) = value.as_f64() {
        return Ok(v);
    }
    let text = value.as_display().unwrap_or_default();
    parse_decimal(text).ok_or_else(|| RowRejection::MalformedCoordinate {
        field,
        value: text.to_owned(),
    })
}

fn split_pair(
    cell: &str,
    order: CoordinateOrder,
    separator: &str,
) -> Result<(f64, f64), RowRejection> {
    let malformed = || RowRejection::MalformedCoordinate {
        field: "coordinates",
        value: cell.to_owned(),
    };
    let (first, second) = cell.split_once(separator).ok_or_else(malformed)?;
    let first = parse_decimal(first).ok_or_else(malformed)?;
    let second = parse_decimal(second).ok_or_else(malformed)?;
    Ok(match order {
        CoordinateOrder::LongitudeFirst => (first, second),
        CoordinateOrder::LatitudeFirst => (second, first),
    })
}

/// Parses a finite decimal number, retrying with `,` replaced by `.` for
/// values written with a decimal comma.
#[must_use]
pub fn parse_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    text.parse::<f64>()
        .ok()
        .or_else(|| text.replace(',', ".").parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
