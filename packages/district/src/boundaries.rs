//! In-memory R-tree of district boundary polygons.
//!
//! Built from a `GeoJSON` `FeatureCollection` in which each feature carries
//! the district name (or official number) in a configurable property.

use std::str::FromStr;

use geo::{Contains, MultiPolygon};
use geojson::GeoJson;
use madrid_map_feature_models::{District, Position};
use rstar::{AABB, RTree, RTreeObject};

use crate::{BoundaryError, DistrictNormalizer};

/// Property read for the district name when none is configured.
pub const DEFAULT_NAME_PROPERTY: &str = "NOMBRE";

/// A boundary polygon stored in the R-tree with its district.
#[derive(Debug)]
struct BoundaryEntry {
    name: String,
    district: District,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index over district polygons.
#[derive(Debug)]
pub struct DistrictBoundaries {
    tree: RTree<BoundaryEntry>,
}

impl DistrictBoundaries {
    /// Parses a `FeatureCollection` and indexes every feature whose
    /// `name_property` resolves to a district.
    ///
    /// Features with an unresolvable name or a non-polygon geometry are
    /// skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if the text is not a `GeoJSON`
    /// `FeatureCollection`, or if no feature could be indexed.
    pub fn from_geojson(text: &str, name_property: &str) -> Result<Self, BoundaryError> {
        let GeoJson::FeatureCollection(collection) = GeoJson::from_str(text)? else {
            return Err(BoundaryError::NotFeatureCollection);
        };

        let normalizer = DistrictNormalizer::new();
        let mut entries = Vec::new();

        for feature in collection.features {
            let Some((name, district)) = feature
                .property(name_property)
                .and_then(|value| district_from_property(&normalizer, value))
            else {
                log::warn!("Skipping boundary without a recognizable {name_property:?} property");
                continue;
            };

            let Some(polygon) = feature.geometry.and_then(to_multipolygon) else {
                log::warn!("Skipping boundary {name:?}: geometry is not a polygon");
                continue;
            };

            entries.push(BoundaryEntry {
                name,
                district,
                envelope: compute_envelope(&polygon),
                polygon,
            });
        }

        if entries.is_empty() {
            return Err(BoundaryError::NoBoundaries {
                property: name_property.to_string(),
            });
        }

        log::info!("Loaded {} district boundaries into spatial index", entries.len());

        Ok(Self {
            tree: RTree::bulk_load(entries),
        })
    }

    /// Number of indexed boundaries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// The raw boundary names with the district each resolved to.
    pub fn names(&self) -> impl Iterator<Item = (&str, District)> {
        self.tree.iter().map(|e| (e.name.as_str(), e.district))
    }

    /// Looks up the district containing a position.
    ///
    /// Districts tile the municipality without overlap, so first match
    /// wins.
    #[must_use]
    pub fn locate(&self, position: Position) -> Option<District> {
        let point = geo::Point::new(position.longitude, position.latitude);
        let query_env = AABB::from_point([position.longitude, position.latitude]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .find(|entry| entry.polygon.contains(&point))
            .map(|entry| entry.district)
    }
}

/// Reads a district from a name (string) or official number property.
fn district_from_property(
    normalizer: &DistrictNormalizer,
    value: &geojson::JsonValue,
) -> Option<(String, District)> {
    if let Some(name) = value.as_str() {
        let district = normalizer.normalize(Some(name));
        return (!district.is_unknown()).then(|| (name.trim().to_string(), district));
    }
    let code = u8::try_from(value.as_u64()?).ok()?;
    District::from_code(code).map(|d| (d.name().to_string(), d))
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    use geo::BoundingRect;

    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(west: f64, south: f64, east: f64, north: f64) -> String {
        format!(
            r#"{{"type":"Polygon","coordinates":[[[{west},{south}],[{east},{south}],[{east},{north}],[{west},{north}],[{west},{south}]]]}}"#
        )
    }

    fn collection(features: &[(&str, String)]) -> String {
        let features: Vec<String> = features
            .iter()
            .map(|(name, geometry)| {
                format!(r#"{{"type":"Feature","properties":{{"NOMBRE":{name}}},"geometry":{geometry}}}"#)
            })
            .collect();
        format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        )
    }

    fn sample() -> DistrictBoundaries {
        DistrictBoundaries::from_geojson(
            &collection(&[
                ("\"CENTRO\"", square(-3.72, 40.40, -3.69, 40.43)),
                ("\"Retiro\"", square(-3.69, 40.40, -3.66, 40.43)),
                ("7", square(-3.72, 40.43, -3.69, 40.45)),
                ("\"Atlantis\"", square(-3.60, 40.40, -3.55, 40.45)),
            ]),
            DEFAULT_NAME_PROPERTY,
        )
        .unwrap()
    }

    #[test]
    fn indexes_named_and_numbered_boundaries() {
        let boundaries = sample();
        assert_eq!(boundaries.len(), 3);
        let mut districts: Vec<District> = boundaries.names().map(|(_, d)| d).collect();
        districts.sort();
        assert_eq!(
            districts,
            vec![District::Centro, District::Retiro, District::Chamberi]
        );
    }

    #[test]
    fn locates_points() {
        let boundaries = sample();
        assert_eq!(
            boundaries.locate(Position::new(-3.705, 40.415)),
            Some(District::Centro)
        );
        assert_eq!(
            boundaries.locate(Position::new(-3.675, 40.415)),
            Some(District::Retiro)
        );
        assert_eq!(
            boundaries.locate(Position::new(-3.705, 40.44)),
            Some(District::Chamberi)
        );
        assert_eq!(boundaries.locate(Position::new(-3.58, 40.42)), None);
    }

    #[test]
    fn normalizer_falls_back_to_boundaries() {
        let normalizer = DistrictNormalizer::new().with_boundaries(sample());
        assert!(normalizer.has_boundaries());
        assert_eq!(
            normalizer.resolve(Some("???"), Position::new(-3.675, 40.415)),
            District::Retiro
        );
        assert_eq!(
            normalizer.resolve(Some("Centro"), Position::new(-3.675, 40.415)),
            District::Centro
        );
        assert_eq!(
            normalizer.resolve(None, Position::new(-3.58, 40.42)),
            District::Unknown
        );
    }

    #[test]
    fn rejects_non_collections() {
        assert!(matches!(
            DistrictBoundaries::from_geojson(&square(0.0, 0.0, 1.0, 1.0), "NOMBRE"),
            Err(BoundaryError::NotFeatureCollection)
        ));
        assert!(matches!(
            DistrictBoundaries::from_geojson("not json", "NOMBRE"),
            Err(BoundaryError::GeoJson(_))
        ));
    }

    #[test]
    fn rejects_collections_without_districts() {
        let text = collection(&[("\"Atlantis\"", square(0.0, 0.0, 1.0, 1.0))]);
        assert!(matches!(
            DistrictBoundaries::from_geojson(&text, "NOMBRE"),
            Err(BoundaryError::NoBoundaries { .. })
        ));
    }
}
