//! District name normalization.
//!
//! Names arrive in every spelling the source datasets have used over the
//! years: upper case without accents, abbreviated, hyphenated or not,
//! sometimes prefixed with the district number. Resolution runs:
//!
//! 1. Blank input → [`District::Unknown`]
//! 2. Fold: lowercase, strip diacritics, collapse `-`/`_`/whitespace runs
//!    to single spaces, trim (blank result → [`District::Unknown`])
//! 3. Exact hit in the alias table (canonical names included)
//! 4. Containment against the folded canonical names, in either
//!    direction; the first district in official order wins
//! 5. Otherwise [`District::Unknown`]

use std::collections::BTreeMap;
use std::sync::LazyLock;

use madrid_map_feature_models::{District, Position};
use regex::Regex;

use crate::DistrictBoundaries;

/// Collapses separators into a single space.
static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-_]+").expect("valid regex"));

/// Common variants that do not contain their canonical name.
///
/// Keys are already folded.
static ALIASES: LazyLock<BTreeMap<&'static str, District>> = LazyLock::new(|| {
    BTreeMap::from([
        ("centro historico", District::Centro),
        ("sol", District::Centro),
        ("chamartin de la rosa", District::Chamartin),
        ("tetuan de las victorias", District::Tetuan),
        ("fuencarral", District::FuencarralElPardo),
        ("el pardo", District::FuencarralElPardo),
        ("fuencarral pardo", District::FuencarralElPardo),
        ("moncloa", District::MoncloaAravaca),
        ("aravaca", District::MoncloaAravaca),
        ("pte vallecas", District::PuenteDeVallecas),
        ("pte de vallecas", District::PuenteDeVallecas),
        ("puente vallecas", District::PuenteDeVallecas),
        ("vallecas puente", District::PuenteDeVallecas),
        ("villa vallecas", District::VillaDeVallecas),
        ("vallecas villa", District::VillaDeVallecas),
        ("c lineal", District::CiudadLineal),
        ("cdad lineal", District::CiudadLineal),
        ("san blas", District::SanBlasCanillejas),
        ("canillejas", District::SanBlasCanillejas),
        ("sanblas", District::SanBlasCanillejas),
    ])
});

/// Canonical names, folded, in official order.
static CANONICAL: LazyLock<Vec<(String, District)>> = LazyLock::new(|| {
    District::all()
        .iter()
        .map(|d| (fold_name(d.name()), *d))
        .collect()
});

/// Combining diacritical marks, as left behind by decomposed (NFD) text.
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{300}'..='\u{36f}';

/// Lowercases, strips diacritics and collapses separators.
///
/// `"  SAN_BLAS-Canillejas "` and `"San Blas - Canillejas"` both fold to
/// `"san blas canillejas"`. Accents are stripped whether they are
/// precomposed (`"á"`) or a separate combining mark (`"a\u{301}"`).
#[must_use]
pub fn fold_name(input: &str) -> String {
    let lowered: String = input
        .chars()
        .filter(|c| !COMBINING_MARKS.contains(c))
        .flat_map(char::to_lowercase)
        .map(strip_accent)
        .collect();
    SEPARATOR_RE.replace_all(&lowered, " ").trim().to_string()
}

const fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Total mapping from free text (and optionally a position) to a
/// [`District`].
#[derive(Debug)]
pub struct DistrictNormalizer {
    /// Folded alias → district. Seeded from the canonical names and the
    /// static alias table.
    aliases: BTreeMap<String, District>,
    boundaries: Option<DistrictBoundaries>,
}

impl Default for DistrictNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DistrictNormalizer {
    /// Creates a normalizer backed by the static alias table only.
    #[must_use]
    pub fn new() -> Self {
        let mut aliases: BTreeMap<String, District> = CANONICAL.iter().cloned().collect();
        for (alias, district) in ALIASES.iter() {
            aliases.insert((*alias).to_string(), *district);
        }
        Self {
            aliases,
            boundaries: None,
        }
    }

    /// Adds boundary polygons: each boundary's own name becomes an alias,
    /// and [`Self::resolve`] falls back to point-in-polygon lookup.
    #[must_use]
    pub fn with_boundaries(mut self, boundaries: DistrictBoundaries) -> Self {
        for (name, district) in boundaries.names() {
            let folded = fold_name(name);
            if !folded.is_empty() {
                self.aliases.entry(folded).or_insert(district);
            }
        }
        self.boundaries = Some(boundaries);
        self
    }

    /// Whether boundary polygons are attached.
    #[must_use]
    pub const fn has_boundaries(&self) -> bool {
        self.boundaries.is_some()
    }

    /// Number of folded aliases known.
    #[must_use]
    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    /// Resolves a raw district name. Never fails.
    #[must_use]
    pub fn normalize(&self, raw: Option<&str>) -> District {
        let Some(raw) = raw else {
            return District::Unknown;
        };
        let folded = fold_name(raw);
        if folded.is_empty() {
            return District::Unknown;
        }

        if let Some(district) = self.aliases.get(&folded) {
            return *district;
        }

        CANONICAL
            .iter()
            .find(|(canonical, _)| {
                folded.contains(canonical.as_str()) || canonical.contains(folded.as_str())
            })
            .map_or(District::Unknown, |(_, district)| *district)
    }

    /// Resolves a district from its raw name, falling back to the
    /// boundary containing `position` when the name does not resolve.
    #[must_use]
    pub fn resolve(&self, raw: Option<&str>, position: Position) -> District {
        let district = self.normalize(raw);
        if !district.is_unknown() {
            return district;
        }
        self.locate(position).unwrap_or(District::Unknown)
    }

    /// Looks up the boundary containing `position`, if boundaries are
    /// attached.
    #[must_use]
    pub fn locate(&self, position: Position) -> Option<District> {
        self.boundaries.as_ref().and_then(|b| b.locate(position))
    }
}
