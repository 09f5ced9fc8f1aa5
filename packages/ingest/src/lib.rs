#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incremental loading of the Madrid street furniture datasets, plus the
//! session that keeps the filter and statistics in step with the loaded
//! features.

pub mod config;
pub mod interactive;
pub mod loader;
pub mod report;
pub mod session;
pub mod sink;
pub mod store;

use madrid_map_source::source_def::DatasetDefinition;

pub use config::LoaderConfig;
pub use loader::{DatasetError, IncrementalLoader, LoadError};
pub use session::Session;
pub use sink::{CollectingErrorSink, ErrorSink, LogErrorSink};
pub use store::{InMemoryMarkerStore, MarkerStore};

/// Returns all configured datasets from the TOML registry.
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    madrid_map_source::registry::all_datasets()
}

/// Returns the datasets named in `ids`, or all of them when `ids` is
/// empty. Warns when the filter matches nothing.
#[must_use]
pub fn enabled_datasets(ids: &[String]) -> Vec<DatasetDefinition> {
    let filtered = madrid_map_source::registry::select_datasets(ids);

    if filtered.is_empty() {
        log::warn!(
            "No matching datasets found for filter {:?}. Available: {}",
            ids,
            all_datasets()
                .iter()
                .map(|d| d.id().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_enables_everything() {
        assert_eq!(enabled_datasets(&[]).len(), all_datasets().len());
    }

    #[test]
    fn filter_keeps_registry_order() {
        let ids = vec!["acoustic_signals".to_string(), "TRAFFIC_LIGHTS".to_string()];
        let enabled: Vec<String> = enabled_datasets(&ids)
            .iter()
            .map(|d| d.id().to_string())
            .collect();
        assert_eq!(enabled, ["traffic_lights", "acoustic_signals"]);
    }

    #[test]
    fn unknown_ids_enable_nothing() {
        assert!(enabled_datasets(&["bus_stops".to_string()]).is_empty());
    }
}
