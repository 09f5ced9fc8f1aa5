#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Street furniture taxonomy and the canonical feature model.
//!
//! Every dataset (traffic lights, streetlights, acoustic signals) is
//! normalized into [`Feature`] records. A feature's category is carried by
//! its [`FeatureDetails`] variant, so the category-specific attributes can
//! only exist on the category they belong to.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Placeholder for attributes that do not apply to a feature's category.
pub const NOT_APPLICABLE: &str = "N/A";

/// Placeholder for attributes that apply but were missing in the source.
pub const UNKNOWN: &str = "Unknown";

/// Kind of street furniture a feature describes.
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
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum FeatureCategory {
    /// Traffic light installation at a junction or crossing
    TrafficLight,
    /// Public street lighting point
    Streetlight,
    /// Acoustic signal for visually impaired pedestrians
    AcousticSignal,
}

impl FeatureCategory {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::TrafficLight, Self::Streetlight, Self::AcousticSignal]
    }

    /// Human-readable label (e.g. for table headers).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TrafficLight => "Traffic lights",
            Self::Streetlight => "Streetlights",
            Self::AcousticSignal => "Acoustic signals",
        }
    }

    /// Whether features of this category carry a neighborhood.
    #[must_use]
    pub const fn has_neighborhood(self) -> bool {
        matches!(self, Self::Streetlight)
    }
}

/// The 21 administrative districts of Madrid, in official numbering
/// order, plus the [`District::Unknown`] sentinel.
///
/// The derived ordering follows the official numbering, so sorted
/// collections list districts the way the city does.
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
pub enum District {
    /// 01
    #[strum(to_string = "Centro")]
    Centro,
    /// 02
    #[strum(to_string = "Arganzuela")]
    Arganzuela,
    /// 03
    #[strum(to_string = "Retiro")]
    Retiro,
    /// 04
    #[strum(to_string = "Salamanca")]
    Salamanca,
    /// 05
    #[serde(rename = "Chamartín")]
    #[strum(to_string = "Chamartín")]
    Chamartin,
    /// 06
    #[serde(rename = "Tetuán")]
    #[strum(to_string = "Tetuán")]
    Tetuan,
    /// 07
    #[serde(rename = "Chamberí")]
    #[strum(to_string = "Chamberí")]
    Chamberi,
    /// 08
    #[serde(rename = "Fuencarral-El Pardo")]
    #[strum(to_string = "Fuencarral-El Pardo")]
    FuencarralElPardo,
    /// 09
    #[serde(rename = "Moncloa-Aravaca")]
    #[strum(to_string = "Moncloa-Aravaca")]
    MoncloaAravaca,
    /// 10
    #[strum(to_string = "Latina")]
    Latina,
    /// 11
    #[strum(to_string = "Carabanchel")]
    Carabanchel,
    /// 12
    #[strum(to_string = "Usera")]
    Usera,
    /// 13
    #[serde(rename = "Puente de Vallecas")]
    #[strum(to_string = "Puente de Vallecas")]
    PuenteDeVallecas,
    /// 14
    #[strum(to_string = "Moratalaz")]
    Moratalaz,
    /// 15
    #[serde(rename = "Ciudad Lineal")]
    #[strum(to_string = "Ciudad Lineal")]
    CiudadLineal,
    /// 16
    #[strum(to_string = "Hortaleza")]
    Hortaleza,
    /// 17
    #[strum(to_string = "Villaverde")]
    Villaverde,
    /// 18
    #[serde(rename = "Villa de Vallecas")]
    #[strum(to_string = "Villa de Vallecas")]
    VillaDeVallecas,
    /// 19
    #[serde(rename = "Vicálvaro")]
    #[strum(to_string = "Vicálvaro")]
    Vicalvaro,
    /// 20
    #[serde(rename = "San Blas-Canillejas")]
    #[strum(to_string = "San Blas-Canillejas")]
    SanBlasCanillejas,
    /// 21
    #[strum(to_string = "Barajas")]
    Barajas,
    /// Sentinel for names that could not be resolved to a district.
    #[strum(to_string = "Unknown")]
    Unknown,
}

impl District {
    /// Returns the 21 real districts in official order (excludes
    /// [`District::Unknown`]).
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Centro,
            Self::Arganzuela,
            Self::Retiro,
            Self::Salamanca,
            Self::Chamartin,
            Self::Tetuan,
            Self::Chamberi,
            Self::FuencarralElPardo,
            Self::MoncloaAravaca,
            Self::Latina,
            Self::Carabanchel,
            Self::Usera,
            Self::PuenteDeVallecas,
            Self::Moratalaz,
            Self::CiudadLineal,
            Self::Hortaleza,
            Self::Villaverde,
            Self::VillaDeVallecas,
            Self::Vicalvaro,
            Self::SanBlasCanillejas,
            Self::Barajas,
        ]
    }

    /// Canonical name as published by the city (with diacritics).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Centro => "Centro",
            Self::Arganzuela => "Arganzuela",
            Self::Retiro => "Retiro",
            Self::Salamanca => "Salamanca",
            Self::Chamartin => "Chamartín",
            Self::Tetuan => "Tetuán",
            Self::Chamberi => "Chamberí",
            Self::FuencarralElPardo => "Fuencarral-El Pardo",
            Self::MoncloaAravaca => "Moncloa-Aravaca",
            Self::Latina => "Latina",
            Self::Carabanchel => "Carabanchel",
            Self::Usera => "Usera",
            Self::PuenteDeVallecas => "Puente de Vallecas",
            Self::Moratalaz => "Moratalaz",
            Self::CiudadLineal => "Ciudad Lineal",
            Self::Hortaleza => "Hortaleza",
            Self::Villaverde => "Villaverde",
            Self::VillaDeVallecas => "Villa de Vallecas",
            Self::Vicalvaro => "Vicálvaro",
            Self::SanBlasCanillejas => "San Blas-Canillejas",
            Self::Barajas => "Barajas",
            Self::Unknown => UNKNOWN,
        }
    }

    /// Official district number (1-21), `None` for the sentinel.
    #[must_use]
    pub fn code(self) -> Option<u8> {
        Self::all()
            .iter()
            .position(|d| *d == self)
            .and_then(|i| u8::try_from(i + 1).ok())
    }

    /// Looks a district up by its official number.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::all().get(usize::from(code).checked_sub(1)?).copied()
    }

    /// Whether this is the [`District::Unknown`] sentinel.
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }
}

/// A WGS84 position, longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Latitude in decimal degrees.
    pub latitude: f64,
}

impl Position {
    /// Creates a position from a longitude/latitude pair.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// Category-specific attributes of a feature.
///
/// Each variant carries only the fields that are meaningful for that
/// category; the variant itself is the feature's category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureDetails {
    /// Traffic light attributes.
    TrafficLight {
        /// Source identifier of the installation.
        id: String,
        /// Installation type.
        kind: String,
    },
    /// Streetlight attributes.
    Streetlight {
        /// Luminaire type.
        kind: String,
        /// Neighborhood (barrio) the streetlight belongs to.
        neighborhood: String,
        /// Street address.
        address: String,
    },
    /// Acoustic signal attributes.
    AcousticSignal {
        /// Source identifier of the signal.
        id: String,
        /// Signal type.
        kind: String,
    },
}

impl FeatureDetails {
    /// The category this variant represents.
    #[must_use]
    pub const fn category(&self) -> FeatureCategory {
        match self {
            Self::TrafficLight { .. } => FeatureCategory::TrafficLight,
            Self::Streetlight { .. } => FeatureCategory::Streetlight,
            Self::AcousticSignal { .. } => FeatureCategory::AcousticSignal,
        }
    }
}

/// One physical item of street furniture with a validated position and
/// normalized attributes.
///
/// Features are immutable once built: there are no setters, and the
/// district is resolved once by whoever constructs the feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    position: Position,
    district: District,
    #[serde(flatten)]
    details: FeatureDetails,
}

impl Feature {
    /// Creates a feature from already-validated parts.
    #[must_use]
    pub const fn new(position: Position, district: District, details: FeatureDetails) -> Self {
        Self {
            position,
            district,
            details,
        }
    }

    /// The feature's category.
    #[must_use]
    pub const fn category(&self) -> FeatureCategory {
        self.details.category()
    }

    /// The feature's position.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// The normalized district.
    #[must_use]
    pub const fn district(&self) -> District {
        self.district
    }

    /// Category-specific attributes.
    #[must_use]
    pub const fn details(&self) -> &FeatureDetails {
        &self.details
    }

    /// Neighborhood name, or [`NOT_APPLICABLE`] for categories without one.
    #[must_use]
    pub fn neighborhood(&self) -> &str {
        match &self.details {
            FeatureDetails::Streetlight { neighborhood, .. } => neighborhood,
            FeatureDetails::TrafficLight { .. } | FeatureDetails::AcousticSignal { .. } => {
                NOT_APPLICABLE
            }
        }
    }

    /// Source identifier, or [`NOT_APPLICABLE`] for streetlights.
    #[must_use]
    pub fn id(&self) -> &str {
        match &self.details {
            FeatureDetails::TrafficLight { id, .. } | FeatureDetails::AcousticSignal { id, .. } => {
                id
            }
            FeatureDetails::Streetlight { .. } => NOT_APPLICABLE,
        }
    }

    /// Street address, or [`NOT_APPLICABLE`] for categories without one.
    #[must_use]
    pub fn address(&self) -> &str {
        match &self.details {
            FeatureDetails::Streetlight { address, .. } => address,
            FeatureDetails::TrafficLight { .. } | FeatureDetails::AcousticSignal { .. } => {
                NOT_APPLICABLE
            }
        }
    }

    /// Descriptive type of the item.
    #[must_use]
    pub fn kind(&self) -> &str {
        match &self.details {
            FeatureDetails::TrafficLight { kind, .. }
            | FeatureDetails::Streetlight { kind, .. }
            | FeatureDetails::AcousticSignal { kind, .. } => kind,
        }
    }

    /// The `(label, value)` pairs shown when the feature is inspected on
    /// the map, in display order.
    #[must_use]
    pub fn popup_content(&self) -> Vec<(&'static str, &str)> {
        let district = self.district.name();
        match &self.details {
            FeatureDetails::TrafficLight { id, kind } => vec![
                ("Category", self.category().label()),
                ("ID", id),
                ("Type", kind),
                ("District", district),
            ],
            FeatureDetails::Streetlight {
                kind,
                neighborhood,
                address,
            } => vec![
                ("Category", self.category().label()),
                ("Type", kind),
                ("District", district),
                ("Neighborhood", neighborhood),
                ("Address", address),
            ],
            FeatureDetails::AcousticSignal { id, kind } => vec![
                ("Category", self.category().label()),
                ("ID", id),
                ("Type", kind),
                ("District", district),
            ],
        }
    }
}
