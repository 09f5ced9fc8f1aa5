#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Resolves free-text district names to Madrid's closed 21-district
//! vocabulary.
//!
//! [`DistrictNormalizer`] is total: every input resolves to a district or
//! to [`District::Unknown`]. When district boundary polygons are available
//! ([`DistrictBoundaries`]) they contribute extra name aliases and a
//! point-in-polygon fallback for positions whose name did not resolve.
//!
//! [`District::Unknown`]: madrid_map_feature_models::District::Unknown

pub mod boundaries;
pub mod normalize;

pub use boundaries::DistrictBoundaries;
pub use normalize::{DistrictNormalizer, fold_name};

/// Errors raised while loading district boundaries.
#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    /// The payload is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The payload is valid `GeoJSON` but not a `FeatureCollection`.
    #[error("expected a GeoJSON FeatureCollection")]
    NotFeatureCollection,

    /// No feature in the collection could be matched to a district.
    #[error("no boundary matched a district using property {property:?}")]
    NoBoundaries {
        /// Property that was read for the district name.
        property: String,
    },
}
