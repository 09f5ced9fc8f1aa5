//! Retrieval of dataset payloads.
//!
//! The loader only needs "give me the text of this resource", so every
//! backend implements [`DatasetFetcher`]. Each fetch is a single attempt;
//! a failure is reported to the caller as-is.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::FetchError;

/// Retrieves the raw text of a named resource.
#[async_trait::async_trait]
pub trait DatasetFetcher: Send + Sync {
    /// Human-readable location used in log messages.
    fn describe(&self) -> String;

    /// Fetches a resource as text. Invalid UTF-8 is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the resource cannot be retrieved.
    async fn fetch(&self, resource: &str) -> Result<String, FetchError>;
}

/// Fetches resources over HTTP relative to a base URL.
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    /// Creates a fetcher rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Full URL of a resource.
    #[must_use]
    pub fn url_for(&self, resource: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            resource.trim_start_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl DatasetFetcher for HttpFetcher {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn fetch(&self, resource: &str) -> Result<String, FetchError> {
        let url = self.url_for(resource);
        log::debug!("GET {url}");
        let bytes = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        log::debug!("Fetched {} bytes from {url}", bytes.len());
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Reads resources from a local directory.
pub struct DirectoryFetcher {
    root: PathBuf,
}

impl DirectoryFetcher {
    /// Creates a fetcher reading files below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory resources are read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl DatasetFetcher for DirectoryFetcher {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn fetch(&self, resource: &str) -> Result<String, FetchError> {
        let path = self.root.join(resource);
        let bytes = tokio::fs::read(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FetchError::NotFound {
                    resource: resource.to_owned(),
                }
            } else {
                FetchError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Serves resources from memory. Handy for embedding fixtures and tests.
#[derive(Default)]
pub struct MemoryFetcher {
    resources: BTreeMap<String, String>,
}

impl MemoryFetcher {
    /// Creates an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a resource.
    #[must_use]
    pub fn with_resource(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.resources.insert(name.into(), text.into());
        self
    }
}

#[async_trait::async_trait]
impl DatasetFetcher for MemoryFetcher {
    fn describe(&self) -> String {
        format!("memory ({} resources)", self.resources.len())
    }

    async fn fetch(&self, resource: &str) -> Result<String, FetchError> {
        self.resources
            .get(resource)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                resource: resource.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_url_and_resource() {
        let fetcher = HttpFetcher::new("https://datos.madrid.es/egob/catalogo/");
        assert_eq!(
            fetcher.url_for("/semaforos.csv"),
            "https://datos.madrid.es/egob/catalogo/semaforos.csv"
        );
    }

    #[tokio::test]
    async fn memory_fetcher_serves_known_resources() {
        let fetcher = MemoryFetcher::new().with_resource("a.csv", "A\n1\n");
        assert_eq!(fetcher.fetch("a.csv").await.unwrap(), "A\n1\n");
        assert!(matches!(
            fetcher.fetch("b.csv").await,
            Err(FetchError::NotFound { resource }) if resource == "b.csv"
        ));
    }

    #[tokio::test]
    async fn directory_fetcher_reports_missing_files() {
        let fetcher = DirectoryFetcher::new(std::env::temp_dir().join("madrid-map-missing-dir"));
        assert!(matches!(
            fetcher.fetch("semaforos.csv").await,
            Err(FetchError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn directory_fetcher_reads_lossy_utf8() {
        let dir = std::env::temp_dir().join(format!("madrid-map-fetch-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("x.csv"), b"A;B\nVic\xe1lvaro;1\n").unwrap();

        let text = DirectoryFetcher::new(&dir).fetch("x.csv").await.unwrap();
        assert!(text.starts_with("A;B\nVic"));
        assert!(text.contains('\u{fffd}'));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
