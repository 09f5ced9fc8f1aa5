//! Assembles canonical features from validated rows.

use madrid_map_feature_models::{
    District, Feature, FeatureCategory, FeatureDetails, NOT_APPLICABLE, Position, UNKNOWN,
};
use madrid_map_source_models::{RawRow, RawValue};

use crate::source_def::FieldMapping;

/// Builds a [`Feature`] from a row whose coordinates and district have
/// already been resolved.
///
/// Only the attributes meaningful for `category` are read from the row;
/// absent values are replaced by sentinels (`N/A` for a missing type,
/// `Unknown` for a missing identifier, neighborhood or address).
#[must_use]
pub fn build_feature(
    category: FeatureCategory,
    position: Position,
    district: District,
    row: &RawRow,
    fields: &FieldMapping,
) -> Feature {
    let kind = text_field(row, &fields.kind).unwrap_or_else(|| NOT_APPLICABLE.to_owned());

    let details = match category {
        FeatureCategory::TrafficLight => FeatureDetails::TrafficLight {
            id: text_field(row, &fields.id).unwrap_or_else(|| UNKNOWN.to_owned()),
            kind,
        },
        FeatureCategory::Streetlight => FeatureDetails::Streetlight {
            kind,
            neighborhood: text_field(row, &fields.neighborhood)
                .unwrap_or_else(|| UNKNOWN.to_owned()),
            address: fields
                .address
                .as_ref()
                .and_then(|a| a.extract(row))
                .map(|a| collapse_whitespace(&a))
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_owned()),
        },
        FeatureCategory::AcousticSignal => FeatureDetails::AcousticSignal {
            id: text_field(row, &fields.id).unwrap_or_else(|| UNKNOWN.to_owned()),
            kind,
        },
    };

    Feature::new(position, district, details)
}

fn text_field(row: &RawRow, candidates: &[String]) -> Option<String> {
    row.first_present(candidates)
        .and_then(RawValue::as_display)
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
