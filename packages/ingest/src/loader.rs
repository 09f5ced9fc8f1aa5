//! Incremental, chunked dataset loading.
//!
//! Datasets load strictly one after another. Within a dataset, accepted
//! features are committed to the [`MarkerStore`] in fixed-size chunks and
//! the task yields after every commit so a host sharing the thread stays
//! responsive.

use std::sync::Arc;
use std::time::Instant;

use madrid_map_district::DistrictNormalizer;
use madrid_map_feature_models::{District, Feature};
use madrid_map_ingest_models::{DatasetSummary, LoadSummary, Notice};
use madrid_map_source::builder::build_feature;
use madrid_map_source::coordinates::{BoundingBox, MADRID_BOUNDS, validate_coordinates};
use madrid_map_source::fetch::DatasetFetcher;
use madrid_map_source::parsing::RecordParser;
use madrid_map_source::progress::{ProgressCallback, null_progress, percent};
use madrid_map_source::source_def::DatasetDefinition;
use madrid_map_source::{FetchError, ParseError, SchemaError};
use madrid_map_source_models::{RawRow, RowRejection};

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::sink::ErrorSink;
use crate::store::MarkerStore;

/// Why a single dataset could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The payload could not be retrieved.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The payload could not be parsed at all.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The payload's header cannot satisfy the coordinate mapping.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Errors that abort a load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A dataset failed to fetch or parse; no further datasets are loaded.
    #[error("failed to load dataset {dataset}: {source}")]
    DatasetLoadFailed {
        /// Name of the dataset that failed.
        dataset: String,
        /// Underlying cause.
        source: DatasetError,
    },
}

/// Turns dataset payloads into committed feature chunks.
pub struct IncrementalLoader<'a> {
    fetcher: &'a dyn DatasetFetcher,
    normalizer: &'a DistrictNormalizer,
    chunk_size: usize,
    bounds: BoundingBox,
    progress: Arc<dyn ProgressCallback>,
}

impl<'a> IncrementalLoader<'a> {
    /// Creates a loader with the default chunk size and no progress
    /// reporting.
    #[must_use]
    pub fn new(fetcher: &'a dyn DatasetFetcher, normalizer: &'a DistrictNormalizer) -> Self {
        Self {
            fetcher,
            normalizer,
            chunk_size: DEFAULT_CHUNK_SIZE,
            bounds: MADRID_BOUNDS,
            progress: null_progress(),
        }
    }

    /// Sets the number of features per committed chunk (minimum 1).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Sets the progress sink.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Overrides the accepted coordinate region.
    #[must_use]
    pub const fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = bounds;
        self
    }

    /// Loads every dataset in order.
    ///
    /// The first dataset failure aborts the load and is reported to `sink`
    /// as a fatal notice; features committed by earlier datasets stay in
    /// the store. On success a single warning summarizing discarded rows
    /// is sent to `sink` if any row was discarded or left without a
    /// district.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::DatasetLoadFailed`] for the first dataset that
    /// cannot be fetched or parsed.
    pub async fn load_all(
        &self,
        datasets: &[DatasetDefinition],
        store: &mut dyn MarkerStore,
        sink: &dyn ErrorSink,
    ) -> Result<LoadSummary, LoadError> {
        let start = Instant::now();
        let mut summary = LoadSummary::default();

        log::info!(
            "Loading {} dataset(s) from {}",
            datasets.len(),
            self.fetcher.describe()
        );

        for def in datasets {
            match self.load_dataset(def, store).await {
                Ok(dataset) => summary.datasets.push(dataset),
                Err(e) => {
                    sink.notify(Notice::fatal("Dataset load failed", e.to_string()));
                    self.progress.finish(format!("Failed to load {}", def.name()));
                    return Err(e);
                }
            }
        }

        summary.duration = start.elapsed();

        if let Some(report) = summary.rejection_report() {
            sink.notify(Notice::warning("Some rows were skipped", report));
        }

        self.progress.finish(format!(
            "Loaded {} features from {} dataset(s)",
            summary.accepted(),
            summary.datasets.len()
        ));
        log::info!(
            "Load complete: {} features, {} rows skipped, {} unresolved districts, took {:.1}s",
            summary.accepted(),
            summary.rejected(),
            summary.unresolved_districts(),
            summary.duration.as_secs_f64()
        );

        Ok(summary)
    }

    /// Fetches, parses and commits one dataset.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::DatasetLoadFailed`] if the payload cannot be
    /// fetched, has no header, or its header lacks the coordinate columns.
    pub async fn load_dataset(
        &self,
        def: &DatasetDefinition,
        store: &mut dyn MarkerStore,
    ) -> Result<DatasetSummary, LoadError> {
        let start = Instant::now();
        let failed = |source: DatasetError| LoadError::DatasetLoadFailed {
            dataset: def.name().to_string(),
            source,
        };

        self.progress.set_message(format!("Loading {}", def.name()));
        log::info!("Loading {} ({})", def.name(), def.resource);

        let text = self
            .fetcher
            .fetch(&def.resource)
            .await
            .map_err(|e| failed(e.into()))?;
        tokio::task::yield_now().await;

        let parsed = RecordParser::for_dataset(def)
            .parse(&text)
            .map_err(|e| failed(e.into()))?;
        def.check_header(parsed.columns())
            .map_err(|e| failed(e.into()))?;
        let rows: Vec<Result<RawRow, RowRejection>> = parsed.collect();

        let total = rows.len() as u64;
        let mut summary = DatasetSummary::new(def.id(), def.name(), def.category);
        summary.rows = total;
        self.progress.set_total(total);

        let mut chunk: Vec<Feature> = Vec::with_capacity(self.chunk_size);

        for (index, row) in rows.into_iter().enumerate() {
            match row.and_then(|row| self.convert(def, &row, &mut summary)) {
                Ok(feature) => {
                    summary.accepted += 1;
                    chunk.push(feature);
                }
                Err(rejection) => {
                    log::trace!("{}: skipping row: {rejection}", def.id());
                    summary.record_rejection(rejection.kind());
                }
            }

            if chunk.len() >= self.chunk_size {
                let full = std::mem::replace(&mut chunk, Vec::with_capacity(self.chunk_size));
                self.commit(def, full, store, &mut summary);
                let processed = index as u64 + 1;
                self.progress.set_position(processed);
                log::debug!(
                    "{}: {:.0}% of rows processed",
                    def.id(),
                    percent(processed, total) * 100.0
                );
                tokio::task::yield_now().await;
            }
        }

        if !chunk.is_empty() {
            self.commit(def, chunk, store, &mut summary);
        }
        self.progress.set_position(total);
        tokio::task::yield_now().await;

        summary.duration = start.elapsed();
        log::info!(
            "{}: {} of {} rows accepted in {} chunk(s), {} skipped",
            def.name(),
            summary.accepted,
            summary.rows,
            summary.chunks,
            summary.rejected()
        );

        Ok(summary)
    }

    /// Validates one row and builds its feature. The district is resolved
    /// here, once, from the name and then from the boundary index.
    fn convert(
        &self,
        def: &DatasetDefinition,
        row: &RawRow,
        summary: &mut DatasetSummary,
    ) -> Result<Feature, RowRejection> {
        let position = validate_coordinates(row, &def.fields.coordinates, &self.bounds)?;

        let raw_district = def.fields.district_name(row);
        let mut district = self.normalizer.normalize(raw_district);
        if district.is_unknown()
            && let Some(located) = self.normalizer.locate(position)
        {
            summary.located_by_boundary += 1;
            district = located;
        }
        if district == District::Unknown {
            log::debug!(
                "{}: line {}: unresolved district {raw_district:?}",
                def.id(),
                row.line()
            );
            summary.unresolved_districts += 1;
        }

        Ok(build_feature(
            def.category,
            position,
            district,
            row,
            &def.fields,
        ))
    }

    fn commit(
        &self,
        def: &DatasetDefinition,
        chunk: Vec<Feature>,
        store: &mut dyn MarkerStore,
        summary: &mut DatasetSummary,
    ) {
        summary.chunks += 1;
        log::debug!(
            "{}: committing chunk {} ({} features)",
            def.id(),
            summary.chunks,
            chunk.len()
        );
        store.commit_chunk(chunk);
    }
}
