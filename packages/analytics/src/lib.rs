#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics aggregation.
//!
//! A snapshot is always recomputed from scratch in a single pass over the
//! loaded features; there is no incremental bookkeeping to drift out of
//! sync with the filter.

use madrid_map_analytics_models::StatisticsSnapshot;
use madrid_map_feature_models::Feature;
use madrid_map_filter::FilterState;

/// Aggregates the features for which `is_visible` holds.
#[must_use]
pub fn compute_snapshot<'a, I, P>(features: I, is_visible: P) -> StatisticsSnapshot
where
    I: IntoIterator<Item = &'a Feature>,
    P: Fn(&Feature) -> bool,
{
    let mut snapshot = StatisticsSnapshot::default();

    for feature in features {
        if !is_visible(feature) {
            snapshot.hidden += 1;
            continue;
        }

        snapshot.total += 1;
        *snapshot.by_category.entry(feature.category()).or_insert(0) += 1;
        *snapshot.by_district.entry(feature.district()).or_insert(0) += 1;
        *snapshot
            .by_district_category
            .entry(feature.district())
            .or_default()
            .entry(feature.category())
            .or_insert(0) += 1;
        if feature.category().has_neighborhood() {
            *snapshot
                .by_neighborhood
                .entry(feature.neighborhood().to_string())
                .or_insert(0) += 1;
        }
    }

    log::debug!(
        "Computed snapshot: {} visible, {} hidden",
        snapshot.total,
        snapshot.hidden
    );

    snapshot
}

/// Aggregates the features visible under `filter`.
#[must_use]
pub fn compute_filtered<'a, I>(features: I, filter: &FilterState) -> StatisticsSnapshot
where
    I: IntoIterator<Item = &'a Feature>,
{
    compute_snapshot(features, |f| filter.is_visible(f))
}

#[cfg(test)]
mod tests {
    use madrid_map_feature_models::{District, FeatureCategory, FeatureDetails, Position};
    use madrid_map_filter::{Facet, FacetToggle};

    use super::*;

    fn feature(category: FeatureCategory, district: District, neighborhood: &str) -> Feature {
        let details = match category {
            FeatureCategory::TrafficLight => FeatureDetails::TrafficLight {
                id: "1".into(),
                kind: "PEATONAL".into(),
            },
            FeatureCategory::Streetlight => FeatureDetails::Streetlight {
                kind: "LED".into(),
                neighborhood: neighborhood.into(),
                address: "CALLE MAYOR 1".into(),
            },
            FeatureCategory::AcousticSignal => FeatureDetails::AcousticSignal {
                id: "2".into(),
                kind: "PULSADOR".into(),
            },
        };
        Feature::new(Position::new(-3.70, 40.42), district, details)
    }

    fn features() -> Vec<Feature> {
        vec![
            feature(FeatureCategory::TrafficLight, District::Centro, ""),
            feature(FeatureCategory::TrafficLight, District::Retiro, ""),
            feature(FeatureCategory::Streetlight, District::Centro, "Sol"),
            feature(FeatureCategory::Streetlight, District::Centro, "Cortes"),
            feature(FeatureCategory::Streetlight, District::Unknown, "Unknown"),
            feature(FeatureCategory::AcousticSignal, District::Retiro, ""),
        ]
    }

    #[test]
    fn counts_placeholder_named_neighborhoods() {
        let features = [feature(FeatureCategory::Streetlight, District::Centro, "N/A")];
        let snapshot = compute_snapshot(&features, |_| true);
        assert_eq!(snapshot.by_neighborhood.get("N/A"), Some(&1));
    }

    #[test]
    fn counts_everything_when_all_visible() {
        let features = features();
        let snapshot = compute_snapshot(&features, |_| true);
        assert_eq!(snapshot.total, 6);
        assert_eq!(snapshot.hidden, 0);
        assert_eq!(snapshot.category_count(FeatureCategory::Streetlight), 3);
        assert_eq!(snapshot.district_count(District::Centro), 3);
        assert_eq!(snapshot.district_count(District::Unknown), 1);
        assert_eq!(
            snapshot.district_category_count(District::Retiro, FeatureCategory::AcousticSignal),
            1
        );
        assert_eq!(snapshot.by_neighborhood.len(), 3);
        assert!(snapshot.is_consistent());
    }

    #[test]
    fn total_equals_sum_of_categories() {
        let features = features();
        let snapshot = compute_snapshot(&features, |f| f.district() != District::Centro);
        assert_eq!(
            snapshot.total,
            snapshot.by_category.values().sum::<u64>()
        );
        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.hidden, 3);
    }

    #[test]
    fn is_deterministic() {
        let features = features();
        let mut reversed = features.clone();
        reversed.reverse();
        assert_eq!(
            compute_snapshot(&features, |_| true),
            compute_snapshot(&reversed, |_| true)
        );
    }

    #[test]
    fn follows_filter_state() {
        let features = features();
        let mut filter = FilterState::seed(&features);
        filter.apply(&FacetToggle::deselect(Facet::Category(
            FeatureCategory::TrafficLight,
        )));
        let snapshot = compute_filtered(&features, &filter);
        assert_eq!(snapshot.category_count(FeatureCategory::TrafficLight), 0);
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.hidden, 2);
    }

    #[test]
    fn empty_input_gives_empty_snapshot() {
        let snapshot = compute_snapshot(std::iter::empty::<&Feature>(), |_| true);
        assert_eq!(snapshot, StatisticsSnapshot::default());
    }
}
