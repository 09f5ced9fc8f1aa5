#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Multi-facet visibility filter.
//!
//! [`FilterState`] holds, per facet kind, the vocabulary discovered from
//! the loaded features and the subset of it that is currently active. A
//! feature is visible iff its category, district and neighborhood are all
//! active; the neighborhood check is skipped for features that have no
//! neighborhood (`N/A`).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use madrid_map_feature_models::{District, Feature, FeatureCategory};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The three independent facets a user can filter by.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FacetKind {
    /// Furniture category.
    Category,
    /// Administrative district.
    District,
    /// Neighborhood (barrio), streetlights only.
    Neighborhood,
}

impl FacetKind {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Category, Self::District, Self::Neighborhood]
    }
}

/// One value of one facet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Facet {
    /// A category value.
    Category(FeatureCategory),
    /// A district value.
    District(District),
    /// A neighborhood value.
    Neighborhood(String),
}

impl Facet {
    /// The facet kind this value belongs to.
    #[must_use]
    pub const fn kind(&self) -> FacetKind {
        match self {
            Self::Category(_) => FacetKind::Category,
            Self::District(_) => FacetKind::District,
            Self::Neighborhood(_) => FacetKind::Neighborhood,
        }
    }

    /// Display text of the value alone.
    #[must_use]
    pub fn value_label(&self) -> &str {
        match self {
            Self::Category(c) => c.label(),
            Self::District(d) => d.name(),
            Self::Neighborhood(n) => n,
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category(c) => write!(f, "{}={c}", self.kind()),
            Self::District(d) => write!(f, "{}={d}", self.kind()),
            Self::Neighborhood(n) => write!(f, "{}={n}", self.kind()),
        }
    }
}

/// Errors parsing a `kind=value` facet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FacetParseError {
    /// No `=` between kind and value.
    #[error("expected kind=value, got {0:?}")]
    MissingSeparator(String),

    /// The kind is not one of `category`, `district`, `neighborhood`.
    #[error("unknown facet kind {0:?}")]
    UnknownKind(String),

    /// The value is not valid for its kind.
    #[error("unknown {kind} value {value:?}")]
    UnknownValue {
        /// Facet kind.
        kind: FacetKind,
        /// Offending value.
        value: String,
    },
}

impl FromStr for Facet {
    type Err = FacetParseError;

    /// Parses `category=STREETLIGHT`, `district=Chamberí` or
    /// `neighborhood=Almagro`. Category and district values are matched
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .split_once('=')
            .ok_or_else(|| FacetParseError::MissingSeparator(s.to_string()))?;
        let kind = FacetKind::from_str(kind.trim())
            .map_err(|_| FacetParseError::UnknownKind(kind.trim().to_string()))?;
        let value = value.trim();
        let unknown = || FacetParseError::UnknownValue {
            kind,
            value: value.to_string(),
        };

        match kind {
            FacetKind::Category => FeatureCategory::from_str(value)
                .map(Self::Category)
                .map_err(|_| unknown()),
            FacetKind::District => District::all()
                .iter()
                .copied()
                .chain(std::iter::once(District::Unknown))
                .find(|d| d.name().to_lowercase() == value.to_lowercase())
                .map(Self::District)
                .ok_or_else(unknown),
            FacetKind::Neighborhood if value.is_empty() => Err(unknown()),
            FacetKind::Neighborhood => Ok(Self::Neighborhood(value.to_string())),
        }
    }
}

/// A facet input event: set `facet` to `selected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetToggle {
    /// The value being changed.
    pub facet: Facet,
    /// Whether it should be active afterwards.
    pub selected: bool,
}

impl FacetToggle {
    /// An event selecting `facet`.
    #[must_use]
    pub const fn select(facet: Facet) -> Self {
        Self {
            facet,
            selected: true,
        }
    }

    /// An event deselecting `facet`.
    #[must_use]
    pub const fn deselect(facet: Facet) -> Self {
        Self {
            facet,
            selected: false,
        }
    }
}

/// Vocabulary plus active subset for one facet kind.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FacetSet<T: Ord> {
    vocabulary: BTreeSet<T>,
    active: BTreeSet<T>,
}

impl<T: Ord + Clone> FacetSet<T> {
    fn seeded(vocabulary: BTreeSet<T>) -> Self {
        Self {
            active: vocabulary.clone(),
            vocabulary,
        }
    }

    /// Returns `false` when `value` is outside the vocabulary.
    fn set(&mut self, value: &T, selected: bool) -> bool {
        if !self.vocabulary.contains(value) {
            return false;
        }
        if selected {
            self.active.insert(value.clone());
        } else {
            self.active.remove(value);
        }
        true
    }

    fn select_all(&mut self) {
        self.active.clone_from(&self.vocabulary);
    }

    fn deselect_all(&mut self) {
        self.active.clear();
    }
}

impl<T: Ord> Default for FacetSet<T> {
    fn default() -> Self {
        Self {
            vocabulary: BTreeSet::new(),
            active: BTreeSet::new(),
        }
    }
}

/// Current visibility filter over the loaded features.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    categories: FacetSet<FeatureCategory>,
    districts: FacetSet<District>,
    neighborhoods: FacetSet<String>,
}

impl FilterState {
    /// Discovers the vocabularies from `features` and selects everything.
    #[must_use]
    pub fn seed<'a>(features: impl IntoIterator<Item = &'a Feature>) -> Self {
        let mut categories = BTreeSet::new();
        let mut districts = BTreeSet::new();
        let mut neighborhoods = BTreeSet::new();

        for feature in features {
            categories.insert(feature.category());
            districts.insert(feature.district());
            if feature.category().has_neighborhood() {
                neighborhoods.insert(feature.neighborhood().to_string());
            }
        }

        log::debug!(
            "Seeded filter with {} categories, {} districts, {} neighborhoods",
            categories.len(),
            districts.len(),
            neighborhoods.len()
        );

        Self {
            categories: FacetSet::seeded(categories),
            districts: FacetSet::seeded(districts),
            neighborhoods: FacetSet::seeded(neighborhoods),
        }
    }

    /// Sets a facet value explicitly. Values outside the discovered
    /// vocabulary are ignored with a warning; returns whether the value
    /// was known.
    pub fn set(&mut self, facet: &Facet, selected: bool) -> bool {
        let known = match facet {
            Facet::Category(c) => self.categories.set(c, selected),
            Facet::District(d) => self.districts.set(d, selected),
            Facet::Neighborhood(n) => self.neighborhoods.set(n, selected),
        };
        if !known {
            log::warn!("Ignoring toggle of {facet}: not among the loaded values");
        }
        known
    }

    /// Flips a facet value. Returns the new membership, or `None` if the
    /// value is outside the vocabulary.
    pub fn toggle(&mut self, facet: &Facet) -> Option<bool> {
        let selected = !self.is_active(facet);
        self.set(facet, selected).then_some(selected)
    }

    /// Applies a facet input event.
    pub fn apply(&mut self, toggle: &FacetToggle) -> bool {
        self.set(&toggle.facet, toggle.selected)
    }

    /// Activates every known value of `kind`.
    pub fn select_all(&mut self, kind: FacetKind) {
        match kind {
            FacetKind::Category => self.categories.select_all(),
            FacetKind::District => self.districts.select_all(),
            FacetKind::Neighborhood => self.neighborhoods.select_all(),
        }
    }

    /// Deactivates every value of `kind`.
    pub fn deselect_all(&mut self, kind: FacetKind) {
        match kind {
            FacetKind::Category => self.categories.deselect_all(),
            FacetKind::District => self.districts.deselect_all(),
            FacetKind::Neighborhood => self.neighborhoods.deselect_all(),
        }
    }

    /// Whether a facet value is currently active.
    #[must_use]
    pub fn is_active(&self, facet: &Facet) -> bool {
        match facet {
            Facet::Category(c) => self.categories.active.contains(c),
            Facet::District(d) => self.districts.active.contains(d),
            Facet::Neighborhood(n) => self.neighborhoods.active.contains(n),
        }
    }

    /// Visibility predicate.
    #[must_use]
    pub fn is_visible(&self, feature: &Feature) -> bool {
        self.categories.active.contains(&feature.category())
            && self.districts.active.contains(&feature.district())
            && (!feature.category().has_neighborhood()
                || self.neighborhoods.active.contains(feature.neighborhood()))
    }

    /// Every known value of `kind`, in sorted order.
    #[must_use]
    pub fn vocabulary(&self, kind: FacetKind) -> Vec<Facet> {
        match kind {
            FacetKind::Category => self
                .categories
                .vocabulary
                .iter()
                .copied()
                .map(Facet::Category)
                .collect(),
            FacetKind::District => self
                .districts
                .vocabulary
                .iter()
                .copied()
                .map(Facet::District)
                .collect(),
            FacetKind::Neighborhood => self
                .neighborhoods
                .vocabulary
                .iter()
                .cloned()
                .map(Facet::Neighborhood)
                .collect(),
        }
    }

    /// Active categories.
    #[must_use]
    pub const fn active_categories(&self) -> &BTreeSet<FeatureCategory> {
        &self.categories.active
    }

    /// Active districts.
    #[must_use]
    pub const fn active_districts(&self) -> &BTreeSet<District> {
        &self.districts.active
    }

    /// Active neighborhoods.
    #[must_use]
    pub const fn active_neighborhoods(&self) -> &BTreeSet<String> {
        &self.neighborhoods.active
    }
}

#[cfg(test)]
mod tests {
    use madrid_map_feature_models::{FeatureDetails, Position};

    use super::*;

    fn traffic_light(district: District) -> Feature {
        Feature::new(
            Position::new(-3.70, 40.42),
            district,
            FeatureDetails::TrafficLight {
                id: "1".into(),
                kind: "PEATONAL".into(),
            },
        )
    }

    fn streetlight(district: District, neighborhood: &str) -> Feature {
        Feature::new(
            Position::new(-3.70, 40.42),
            district,
            FeatureDetails::Streetlight {
                kind: "LED".into(),
                neighborhood: neighborhood.into(),
                address: "CALLE MAYOR 1".into(),
            },
        )
    }

    fn features() -> Vec<Feature> {
        vec![
            traffic_light(District::Centro),
            traffic_light(District::Unknown),
            streetlight(District::Centro, "Sol"),
            streetlight(District::Chamberi, "Almagro"),
        ]
    }

    #[test]
    fn seeds_vocabulary_all_selected() {
        let features = features();
        let filter = FilterState::seed(&features);
        assert_eq!(filter.vocabulary(FacetKind::Category).len(), 2);
        assert_eq!(filter.vocabulary(FacetKind::District).len(), 3);
        assert_eq!(
            filter.vocabulary(FacetKind::Neighborhood),
            vec![
                Facet::Neighborhood("Almagro".into()),
                Facet::Neighborhood("Sol".into())
            ]
        );
        assert!(features.iter().all(|f| filter.is_visible(f)));
    }

    #[test]
    fn deselecting_category_hides_only_that_category() {
        let features = features();
        let mut filter = FilterState::seed(&features);
        assert!(filter.apply(&FacetToggle::deselect(Facet::Category(
            FeatureCategory::TrafficLight
        ))));
        for feature in &features {
            assert_eq!(
                filter.is_visible(feature),
                feature.category() != FeatureCategory::TrafficLight
            );
        }
    }

    #[test]
    fn neighborhood_check_skipped_without_neighborhood() {
        let features = features();
        let mut filter = FilterState::seed(&features);
        filter.deselect_all(FacetKind::Neighborhood);
        assert!(filter.is_visible(&features[0]));
        assert!(!filter.is_visible(&features[2]));
        filter.select_all(FacetKind::Neighborhood);
        assert!(filter.is_visible(&features[2]));
    }

    #[test]
    fn literal_placeholder_neighborhood_is_still_filterable() {
        let features = vec![
            streetlight(District::Centro, "N/A"),
            traffic_light(District::Centro),
        ];
        let mut filter = FilterState::seed(&features);
        assert!(
            filter
                .vocabulary(FacetKind::Neighborhood)
                .contains(&Facet::Neighborhood("N/A".into()))
        );

        filter.deselect_all(FacetKind::Neighborhood);
        assert!(!filter.is_visible(&features[0]));
        assert!(filter.is_visible(&features[1]));
    }

    #[test]
    fn toggles_commute() {
        let features = features();
        let toggles = [
            FacetToggle::deselect(Facet::District(District::Centro)),
            FacetToggle::deselect(Facet::Neighborhood("Almagro".into())),
            FacetToggle::select(Facet::District(District::Centro)),
        ];
        let mut forward = FilterState::seed(&features);
        for t in &toggles {
            forward.apply(t);
        }
        let mut other = FilterState::seed(&features);
        other.apply(&toggles[1]);
        other.apply(&toggles[0]);
        other.apply(&toggles[2]);
        assert_eq!(forward, other);
    }

    #[test]
    fn toggle_flips_membership() {
        let features = features();
        let mut filter = FilterState::seed(&features);
        let centro = Facet::District(District::Centro);
        assert_eq!(filter.toggle(&centro), Some(false));
        assert!(!filter.is_active(&centro));
        assert_eq!(filter.toggle(&centro), Some(true));
        assert!(filter.is_active(&centro));
    }

    #[test]
    fn ignores_values_outside_vocabulary() {
        let features = features();
        let mut filter = FilterState::seed(&features);
        let before = filter.clone();
        assert!(!filter.set(&Facet::District(District::Barajas), true));
        assert_eq!(filter.toggle(&Facet::Neighborhood("Atocha".into())), None);
        assert_eq!(filter, before);
    }

    #[test]
    fn empty_filter_hides_everything() {
        let filter = FilterState::default();
        assert!(!filter.is_visible(&traffic_light(District::Centro)));
    }

    #[test]
    fn parses_facets() {
        assert_eq!(
            "category=streetlight".parse::<Facet>().unwrap(),
            Facet::Category(FeatureCategory::Streetlight)
        );
        assert_eq!(
            "district=CHAMBERÍ".parse::<Facet>().unwrap(),
            Facet::District(District::Chamberi)
        );
        assert_eq!(
            "district=unknown".parse::<Facet>().unwrap(),
            Facet::District(District::Unknown)
        );
        assert_eq!(
            "neighborhood = Almagro ".parse::<Facet>().unwrap(),
            Facet::Neighborhood("Almagro".into())
        );
        assert!(matches!(
            "district".parse::<Facet>(),
            Err(FacetParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            "color=red".parse::<Facet>(),
            Err(FacetParseError::UnknownKind(_))
        ));
        assert!(matches!(
            "district=Atlantis".parse::<Facet>(),
            Err(FacetParseError::UnknownValue { .. })
        ));
    }

    #[test]
    fn facet_display_round_trips() {
        let facet = Facet::District(District::SanBlasCanillejas);
        assert_eq!(facet.to_string(), "district=San Blas-Canillejas");
        assert_eq!(facet.to_string().parse::<Facet>().unwrap(), facet);
    }
}
