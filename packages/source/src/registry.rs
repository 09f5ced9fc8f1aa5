//! Dataset registry: every dataset definition, parsed from embedded TOML.
//!
//! Each `.toml` file in `packages/source/datasets/` is baked into the
//! binary at compile time via [`include_str!`].

use crate::source_def::{DatasetDefinition, parse_dataset_toml};

/// TOML configs embedded at compile time, in load order.
const DATASET_TOMLS: &[(&str, &str)] = &[
    (
        "traffic_lights",
        include_str!("../datasets/traffic_lights.toml"),
    ),
    ("streetlights", include_str!("../datasets/streetlights.toml")),
    (
        "acoustic_signals",
        include_str!("../datasets/acoustic_signals.toml"),
    ),
];

/// Total number of configured datasets (used in tests).
#[cfg(test)]
const EXPECTED_DATASET_COUNT: usize = 3;

/// Returns all configured dataset definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    DATASET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_dataset_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the configured datasets whose ids appear in `ids`, keeping
/// registry order. An empty filter selects every dataset.
#[must_use]
pub fn select_datasets(ids: &[String]) -> Vec<DatasetDefinition> {
    all_datasets()
        .into_iter()
        .filter(|d| ids.is_empty() || ids.iter().any(|id| id.eq_ignore_ascii_case(&d.id)))
        .collect()
}
