//! Runtime configuration for a load.
//!
//! Values start from defaults, are overridden by `MADRID_MAP_*`
//! environment variables, and finally by CLI flags (applied by the
//! binary).

use std::path::PathBuf;

use madrid_map_district::boundaries::DEFAULT_NAME_PROPERTY;
use madrid_map_source::fetch::{DatasetFetcher, DirectoryFetcher, HttpFetcher};

/// Default number of features committed to the marker store at once.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default location of the published datasets.
pub const DEFAULT_BASE_URL: &str = "https://datos.madrid.es/egob/catalogo";

/// Errors in configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The chunk size is not a positive integer.
    #[error("invalid chunk size {value:?}: expected a positive integer")]
    InvalidChunkSize {
        /// The offending value.
        value: String,
    },
}

/// Where and how to load datasets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Base URL resources are fetched from when no data directory is set.
    pub base_url: String,
    /// Local directory to read resources from instead of HTTP.
    pub data_dir: Option<PathBuf>,
    /// Features per committed chunk.
    pub chunk_size: usize,
    /// Dataset ids to load. Empty means all.
    pub datasets: Vec<String>,
    /// Optional district boundary resource (`GeoJSON`).
    pub boundaries: Option<String>,
    /// Boundary property holding the district name.
    pub boundary_property: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            datasets: Vec::new(),
            boundaries: None,
            boundary_property: DEFAULT_NAME_PROPERTY.to_string(),
        }
    }
}

impl LoaderConfig {
    /// Builds a config from defaults overridden by environment variables:
    ///
    /// * `MADRID_MAP_BASE_URL`
    /// * `MADRID_MAP_DATA_DIR`
    /// * `MADRID_MAP_CHUNK_SIZE`
    /// * `MADRID_MAP_DATASETS` (comma-separated ids)
    /// * `MADRID_MAP_BOUNDARIES`
    /// * `MADRID_MAP_BOUNDARY_PROPERTY`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_lookup(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value is invalid.
    pub fn with_lookup(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("MADRID_MAP_BASE_URL") {
            self.base_url = url;
        }
        if let Some(dir) = lookup("MADRID_MAP_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(size) = lookup("MADRID_MAP_CHUNK_SIZE") {
            self.chunk_size = parse_chunk_size(&size)?;
        }
        if let Some(ids) = lookup("MADRID_MAP_DATASETS") {
            self.datasets = split_ids(&ids);
        }
        if let Some(resource) = lookup("MADRID_MAP_BOUNDARIES") {
            self.boundaries = Some(resource);
        }
        if let Some(property) = lookup("MADRID_MAP_BOUNDARY_PROPERTY") {
            self.boundary_property = property;
        }
        Ok(self)
    }

    /// Builds the fetcher this config points at: a local directory when
    /// `data_dir` is set, HTTP otherwise.
    #[must_use]
    pub fn fetcher(&self) -> Box<dyn DatasetFetcher> {
        match &self.data_dir {
            Some(dir) => Box::new(DirectoryFetcher::new(dir)),
            None => Box::new(HttpFetcher::new(&self.base_url)),
        }
    }
}

/// Parses a positive chunk size.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidChunkSize`] for zero or non-numeric input.
pub fn parse_chunk_size(value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::InvalidChunkSize {
            value: value.to_string(),
        })
}

/// Splits a comma-separated id list, dropping blanks.
#[must_use]
pub fn split_ids(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.chunk_size, 500);
        assert!(config.datasets.is_empty());
        assert!(config.boundaries.is_none());
        assert_eq!(config.boundary_property, "NOMBRE");
    }

    #[test]
    fn env_overrides_defaults() {
        let config = LoaderConfig::default()
            .with_lookup(lookup(&[
                ("MADRID_MAP_CHUNK_SIZE", "250"),
                ("MADRID_MAP_DATASETS", "streetlights, traffic_lights,"),
                ("MADRID_MAP_DATA_DIR", "/tmp/madrid"),
                ("MADRID_MAP_BOUNDARIES", "distritos.geojson"),
                ("MADRID_MAP_BASE_URL", ""),
            ]))
            .unwrap();
        assert_eq!(config.chunk_size, 250);
        assert_eq!(config.datasets, ["streetlights", "traffic_lights"]);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/madrid")));
        assert_eq!(config.boundaries.as_deref(), Some("distritos.geojson"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn rejects_bad_chunk_sizes() {
        assert!(parse_chunk_size("0").is_err());
        assert!(parse_chunk_size("-5").is_err());
        assert!(parse_chunk_size("many").is_err());
        assert_eq!(parse_chunk_size(" 64 ").unwrap(), 64);
        assert!(
            LoaderConfig::default()
                .with_lookup(lookup(&[("MADRID_MAP_CHUNK_SIZE", "0")]))
                .is_err()
        );
    }

    #[test]
    fn picks_fetcher_from_data_dir() {
        let http = LoaderConfig::default().fetcher();
        assert_eq!(http.describe(), DEFAULT_BASE_URL);

        let local = LoaderConfig {
            data_dir: Some(PathBuf::from("/data")),
            ..LoaderConfig::default()
        }
        .fetcher();
        assert_eq!(local.describe(), "/data");
    }
}
