//! The explicit application context.
//!
//! A [`Session`] owns the marker store, the filter state and the latest
//! statistics snapshot, and is their only writer. Every state change goes
//! through a `&mut self` method that leaves the three consistent.

use std::sync::Arc;

use madrid_map_analytics::compute_filtered;
use madrid_map_analytics_models::StatisticsSnapshot;
use madrid_map_district::boundaries::DEFAULT_NAME_PROPERTY;
use madrid_map_district::{DistrictBoundaries, DistrictNormalizer};
use madrid_map_filter::{Facet, FacetKind, FacetToggle, FilterState};
use madrid_map_ingest_models::{LoadSummary, Notice};
use madrid_map_source::fetch::DatasetFetcher;
use madrid_map_source::progress::{ProgressCallback, null_progress};
use madrid_map_source::source_def::DatasetDefinition;

use crate::config::{DEFAULT_CHUNK_SIZE, LoaderConfig};
use crate::loader::{IncrementalLoader, LoadError};
use crate::sink::{ErrorSink, log_sink};
use crate::store::{InMemoryMarkerStore, MarkerStore};

/// Loaded features plus the filter and statistics derived from them.
pub struct Session<S: MarkerStore = InMemoryMarkerStore> {
    fetcher: Box<dyn DatasetFetcher>,
    datasets: Vec<DatasetDefinition>,
    normalizer: DistrictNormalizer,
    store: S,
    filter: FilterState,
    snapshot: StatisticsSnapshot,
    progress: Arc<dyn ProgressCallback>,
    sink: Arc<dyn ErrorSink>,
    chunk_size: usize,
    boundaries: Option<String>,
    boundary_property: String,
    summary: Option<LoadSummary>,
}

impl Session<InMemoryMarkerStore> {
    /// Creates a session that loads `datasets` through `fetcher` into an
    /// in-memory store.
    #[must_use]
    pub fn new(fetcher: Box<dyn DatasetFetcher>, datasets: Vec<DatasetDefinition>) -> Self {
        Self {
            fetcher,
            datasets,
            normalizer: DistrictNormalizer::new(),
            store: InMemoryMarkerStore::new(),
            filter: FilterState::default(),
            snapshot: StatisticsSnapshot::default(),
            progress: null_progress(),
            sink: log_sink(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            boundaries: None,
            boundary_property: DEFAULT_NAME_PROPERTY.to_string(),
            summary: None,
        }
    }

    /// Creates a session from a [`LoaderConfig`].
    #[must_use]
    pub fn from_config(config: &LoaderConfig) -> Self {
        let mut session = Self::new(config.fetcher(), crate::enabled_datasets(&config.datasets))
            .with_chunk_size(config.chunk_size);
        if let Some(resource) = &config.boundaries {
            session = session.with_boundaries(resource.clone(), config.boundary_property.clone());
        }
        session
    }
}

impl<S: MarkerStore> Session<S> {
    /// Replaces the marker store.
    #[must_use]
    pub fn with_store<T: MarkerStore>(self, store: T) -> Session<T> {
        Session {
            fetcher: self.fetcher,
            datasets: self.datasets,
            normalizer: self.normalizer,
            store,
            filter: self.filter,
            snapshot: self.snapshot,
            progress: self.progress,
            sink: self.sink,
            chunk_size: self.chunk_size,
            boundaries: self.boundaries,
            boundary_property: self.boundary_property,
            summary: self.summary,
        }
    }

    /// Sets the progress sink used by loads.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Sets the error sink used by loads.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the number of features per committed chunk.
    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Fetches district boundaries from `resource` before the first load.
    #[must_use]
    pub fn with_boundaries(
        mut self,
        resource: impl Into<String>,
        name_property: impl Into<String>,
    ) -> Self {
        self.boundaries = Some(resource.into());
        self.boundary_property = name_property.into();
        self
    }

    /// Replaces the district normalizer.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: DistrictNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Loads every configured dataset from scratch.
    ///
    /// The store, filter and snapshot are reset first. On success the
    /// filter is seeded from the loaded features with everything selected
    /// and the first snapshot is computed. On failure the features
    /// committed before the failing dataset stay in the store but the
    /// filter is left unseeded.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if any dataset fails to load.
    pub async fn load(&mut self) -> Result<&LoadSummary, LoadError> {
        self.store.clear();
        self.filter = FilterState::default();
        self.snapshot = StatisticsSnapshot::default();
        self.summary = None;

        self.load_boundaries().await;

        let loader = IncrementalLoader::new(self.fetcher.as_ref(), &self.normalizer)
            .with_chunk_size(self.chunk_size)
            .with_progress(Arc::clone(&self.progress));
        let summary = loader
            .load_all(&self.datasets, &mut self.store, self.sink.as_ref())
            .await?;

        self.filter = FilterState::seed(self.store.features());
        self.refresh();

        Ok(self.summary.insert(summary))
    }

    async fn load_boundaries(&mut self) {
        if self.normalizer.has_boundaries() {
            return;
        }
        let Some(resource) = self.boundaries.clone() else {
            return;
        };

        let result = match self.fetcher.fetch(&resource).await {
            Ok(text) => DistrictBoundaries::from_geojson(&text, &self.boundary_property)
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(boundaries) => {
                log::info!(
                    "Loaded {} district boundaries from {resource}",
                    boundaries.len()
                );
                self.normalizer = std::mem::take(&mut self.normalizer).with_boundaries(boundaries);
            }
            Err(message) => {
                self.sink.notify(Notice::warning(
                    "District boundaries unavailable",
                    format!("{resource}: {message}. Districts are resolved by name only."),
                ));
            }
        }
    }

    /// Applies a facet input event and recomputes visibility and
    /// statistics. Returns whether the value was known.
    pub fn apply(&mut self, toggle: &FacetToggle) -> bool {
        let known = self.filter.apply(toggle);
        if known {
            self.refresh();
        }
        known
    }

    /// Applies a batch of facet input events with a single recompute.
    /// Returns how many of them named a known value.
    pub fn apply_all<'a>(&mut self, toggles: impl IntoIterator<Item = &'a FacetToggle>) -> usize {
        let known = toggles
            .into_iter()
            .filter(|toggle| self.filter.apply(toggle))
            .count();
        self.refresh();
        known
    }

    /// Flips one facet value. Returns its new membership, or `None` if the
    /// value is not among the loaded ones.
    pub fn toggle(&mut self, facet: &Facet) -> Option<bool> {
        let selected = self.filter.toggle(facet)?;
        self.refresh();
        Some(selected)
    }

    /// Activates every value of `kind`.
    pub fn select_all(&mut self, kind: FacetKind) {
        self.filter.select_all(kind);
        self.refresh();
    }

    /// Deactivates every value of `kind`.
    pub fn deselect_all(&mut self, kind: FacetKind) {
        self.filter.deselect_all(kind);
        self.refresh();
    }

    /// Pushes the current filter to the store and recomputes the snapshot.
    pub fn refresh(&mut self) {
        let filter = &self.filter;
        self.store.apply_visibility(&|f| filter.is_visible(f));
        self.snapshot = compute_filtered(self.store.features(), filter);
    }

    /// The datasets this session loads.
    #[must_use]
    pub fn datasets(&self) -> &[DatasetDefinition] {
        &self.datasets
    }

    /// The district normalizer, including any loaded boundaries.
    #[must_use]
    pub const fn normalizer(&self) -> &DistrictNormalizer {
        &self.normalizer
    }

    /// The marker store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The current filter.
    #[must_use]
    pub const fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// The latest statistics snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &StatisticsSnapshot {
        &self.snapshot
    }

    /// Outcome of the last successful load.
    #[must_use]
    pub const fn summary(&self) -> Option<&LoadSummary> {
        self.summary.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use madrid_map_feature_models::{District, FeatureCategory};
    use madrid_map_ingest_models::Severity;
    use madrid_map_source::fetch::MemoryFetcher;
    use madrid_map_source::registry::all_datasets;

    use super::*;
    use crate::sink::CollectingErrorSink;

    const TRAFFIC: &str = "CODIGO;DISTRITO;TIPO_ELEM;LONGITUD;LATITUD\n\
        1;Centro;SEMAFORO;-3.70;40.42\n\
        2;Retiro;SEMAFORO;-3.68;40.41\n\
        3;Centro;SEMAFORO;-3.00;40.40\n";
    const STREETLIGHTS: &str =
        "DISTRITO;BARRIO;TIPO_LUMINARIA;TIPO_VIA;CALLE;NUMERO;LONGITUD;LATITUD\n\
        CENTRO;Sol;LED;CALLE;Mayor;1;-3.70;40.41\n\
        Chamberí;Trafalgar;VSAP;CALLE;Luchana;2;-3.70;40.43\n";
    const ACOUSTIC: &str = "CODIGO,DISTRITO,TIPO,LONGITUD,LATITUD\n\
        9,RETIRO,PULSADOR,-3.68,40.41\n";

    fn fetcher() -> MemoryFetcher {
        MemoryFetcher::new()
            .with_resource("semaforos.csv", TRAFFIC)
            .with_resource("alumbrado_publico.csv", STREETLIGHTS)
            .with_resource("avisadores_acusticos.csv", ACOUSTIC)
    }

    fn session(fetcher: MemoryFetcher, sink: Arc<CollectingErrorSink>) -> Session {
        Session::new(Box::new(fetcher), all_datasets()).with_sink(sink)
    }

    #[tokio::test]
    async fn load_seeds_filter_and_snapshot() {
        let sink = Arc::new(CollectingErrorSink::new());
        let mut session = session(fetcher(), Arc::clone(&sink));

        let summary = session.load().await.unwrap();
        assert_eq!(summary.accepted(), 5);
        assert_eq!(summary.coordinate_rejections(), 1);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.total, 5);
        assert_eq!(snapshot.hidden, 0);
        assert_eq!(snapshot.district_count(District::Centro), 2);
        assert_eq!(snapshot.district_count(District::Retiro), 2);
        assert_eq!(snapshot.district_count(District::Chamberi), 1);
        assert!(snapshot.is_consistent());

        assert_eq!(session.filter().vocabulary(FacetKind::Category).len(), 3);
        assert_eq!(session.filter().vocabulary(FacetKind::Neighborhood).len(), 2);
        assert_eq!(session.store().visible_count(), 5);
    }

    #[tokio::test]
    async fn toggles_recompute_visibility_and_statistics() {
        let sink = Arc::new(CollectingErrorSink::new());
        let mut session = session(fetcher(), sink);
        session.load().await.unwrap();

        assert!(session.apply(&FacetToggle::deselect(Facet::Category(
            FeatureCategory::Streetlight
        ))));
        assert_eq!(session.snapshot().category_count(FeatureCategory::Streetlight), 0);
        assert_eq!(session.snapshot().total, 3);
        assert_eq!(session.snapshot().hidden, 2);
        assert_eq!(session.store().visible_count(), 3);

        assert_eq!(
            session.toggle(&Facet::District(District::Retiro)),
            Some(false)
        );
        assert_eq!(session.snapshot().total, 1);

        assert_eq!(session.toggle(&Facet::District(District::Usera)), None);

        session.select_all(FacetKind::District);
        session.select_all(FacetKind::Category);
        assert_eq!(session.snapshot().total, 5);

        session.deselect_all(FacetKind::Neighborhood);
        assert_eq!(session.snapshot().total, 3);
        assert_eq!(session.snapshot().category_count(FeatureCategory::Streetlight), 0);
    }

    #[tokio::test]
    async fn batch_toggles_skip_unknown_values() {
        let mut session = session(fetcher(), Arc::new(CollectingErrorSink::new()));
        session.load().await.unwrap();

        let toggles = [
            FacetToggle::deselect(Facet::District(District::Centro)),
            FacetToggle::deselect(Facet::Neighborhood("Atlantis".to_string())),
            FacetToggle::deselect(Facet::Neighborhood("Trafalgar".to_string())),
        ];
        assert_eq!(session.apply_all(&toggles), 2);
        assert_eq!(session.snapshot().total, 2);
        assert_eq!(session.snapshot().district_count(District::Centro), 0);
        assert_eq!(session.snapshot().district_count(District::Chamberi), 0);
    }

    #[tokio::test]
    async fn snapshot_is_deterministic() {
        let mut session = session(fetcher(), Arc::new(CollectingErrorSink::new()));
        session.load().await.unwrap();
        let first = session.snapshot().clone();
        session.refresh();
        assert_eq!(&first, session.snapshot());
    }

    #[tokio::test]
    async fn failed_load_keeps_earlier_features_and_leaves_filter_unseeded() {
        let sink = Arc::new(CollectingErrorSink::new());
        let fetcher = MemoryFetcher::new().with_resource("semaforos.csv", TRAFFIC);
        let mut session = session(fetcher, Arc::clone(&sink));

        assert!(session.load().await.is_err());
        assert_eq!(session.store().len(), 2);
        assert!(session.filter().vocabulary(FacetKind::Category).is_empty());
        assert!(session.summary().is_none());
        assert_eq!(sink.notices()[0].severity, Severity::Fatal);
    }

    #[tokio::test]
    async fn reload_replaces_previous_features() {
        let mut session = session(fetcher(), Arc::new(CollectingErrorSink::new()));
        session.load().await.unwrap();
        session.load().await.unwrap();
        assert_eq!(session.store().len(), 5);
        assert_eq!(session.snapshot().total, 5);
    }

    #[tokio::test]
    async fn missing_boundaries_degrade_to_a_warning() {
        let sink = Arc::new(CollectingErrorSink::new());
        let mut session =
            session(fetcher(), Arc::clone(&sink)).with_boundaries("distritos.geojson", "NOMBRE");

        session.load().await.unwrap();

        assert!(!session.normalizer().has_boundaries());
        let notices = sink.notices();
        assert_eq!(notices[0].severity, Severity::Warning);
        assert_eq!(notices[0].title, "District boundaries unavailable");
        assert_eq!(session.store().len(), 5);
    }

    #[tokio::test]
    async fn loads_boundaries_through_the_fetcher() {
        let geojson = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "NOMBRE": "Retiro" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-3.69, 40.40], [-3.67, 40.40], [-3.67, 40.42], [-3.69, 40.42], [-3.69, 40.40]]]
                }
            }]
        }"#;
        let sink = Arc::new(CollectingErrorSink::new());
        let mut session = session(
            fetcher().with_resource("distritos.geojson", geojson),
            Arc::clone(&sink),
        )
        .with_boundaries("distritos.geojson", "NOMBRE");

        session.load().await.unwrap();

        assert!(session.normalizer().has_boundaries());
        assert!(
            sink.notices()
                .iter()
                .all(|n| n.title != "District boundaries unavailable")
        );
    }
}
