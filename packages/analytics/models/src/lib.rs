#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregate counts over the currently visible features.

use std::collections::BTreeMap;

use madrid_map_feature_models::{District, FeatureCategory};
use serde::{Deserialize, Serialize};

/// Counts of the visible features, broken down by facet.
///
/// Only non-zero buckets are present; maps are ordered (categories and
/// districts in official order, neighborhoods alphabetically) so two
/// snapshots of the same state compare and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    /// Number of visible features.
    pub total: u64,
    /// Number of loaded features the filter hides.
    pub hidden: u64,
    /// Visible features per category.
    pub by_category: BTreeMap<FeatureCategory, u64>,
    /// Visible features per district.
    pub by_district: BTreeMap<District, u64>,
    /// Visible features per district, then per category.
    pub by_district_category: BTreeMap<District, BTreeMap<FeatureCategory, u64>>,
    /// Visible neighborhood-bearing features per neighborhood.
    pub by_neighborhood: BTreeMap<String, u64>,
}

impl StatisticsSnapshot {
    /// Visible count for one category.
    #[must_use]
    pub fn category_count(&self, category: FeatureCategory) -> u64 {
        self.by_category.get(&category).copied().unwrap_or(0)
    }

    /// Visible count for one district.
    #[must_use]
    pub fn district_count(&self, district: District) -> u64 {
        self.by_district.get(&district).copied().unwrap_or(0)
    }

    /// Visible count for one district and category.
    #[must_use]
    pub fn district_category_count(&self, district: District, category: FeatureCategory) -> u64 {
        self.by_district_category
            .get(&district)
            .and_then(|m| m.get(&category))
            .copied()
            .unwrap_or(0)
    }

    /// Number of loaded features, visible or not.
    #[must_use]
    pub const fn loaded(&self) -> u64 {
        self.total + self.hidden
    }

    /// Whether the breakdowns add up to the total.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let categories: u64 = self.by_category.values().sum();
        let districts: u64 = self.by_district.values().sum();
        let nested: u64 = self
            .by_district_category
            .values()
            .flat_map(BTreeMap::values)
            .sum();
        categories == self.total && districts == self.total && nested == self.total
    }
}
