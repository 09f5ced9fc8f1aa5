#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the madrid-map binaries: an `indicatif` row
//! counter behind [`ProgressCallback`] and a logger that cooperates with
//! it.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use madrid_map_source::progress::ProgressCallback;

pub use indicatif::MultiProgress;

/// Row progress for a multi-dataset load.
///
/// Each dataset starts as a spinner while its payload is fetched and
/// parsed, then becomes a bar once the row count is known.
pub struct IndicatifProgress {
    bar: ProgressBar,
    fetching: ProgressStyle,
    rows: ProgressStyle,
}

impl IndicatifProgress {
    /// Adds a row progress bar to `multi`.
    #[must_use]
    pub fn rows_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        Arc::new(Self::with_bar(bar, message))
    }

    fn with_bar(bar: ProgressBar, message: &str) -> Self {
        let fetching = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let rows = ProgressStyle::with_template(
            "  {msg:<28} {wide_bar:.cyan/dim} {pos:>7}/{len:7} rows {percent:>3}%",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

        bar.set_style(fetching.clone());
        bar.set_message(message.to_string());

        Self {
            bar,
            fetching,
            rows,
        }
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(self.rows.clone());
    }

    fn set_position(&self, pos: u64) {
        self.bar.set_position(pos);
    }

    /// A new status means a new dataset: back to the spinner until its
    /// rows are counted.
    fn set_message(&self, msg: String) {
        self.bar.set_style(self.fetching.clone());
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Initializes `pretty_env_logger` (filtered by `RUST_LOG`) behind
/// `indicatif-log-bridge`, so log lines are printed above the progress
/// bars instead of through them.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // A logger may already be installed (tests).
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}
