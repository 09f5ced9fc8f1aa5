//! Progress reporting for dataset loads.
//!
//! [`ProgressCallback`] keeps the loader independent of how progress is
//! shown. The CLI renders it with `indicatif`; tests and library callers
//! that do not care pass [`null_progress`].

use std::sync::Arc;

/// Receives `(processed, total)` updates and status messages from a load.
///
/// Implementations must be `Send + Sync` so they can be shared through an
/// `Arc` with the loader.
pub trait ProgressCallback: Send + Sync {
    /// Set the number of rows the current dataset contains.
    fn set_total(&self, total: u64);

    /// Set the number of rows processed so far (absolute, not delta).
    fn set_position(&self, pos: u64);

    /// Update the status message (e.g. `"Loading Semáforos"`).
    fn set_message(&self, msg: String);

    /// Mark the load as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

/// Completion ratio in `[0, 1]`. An empty dataset counts as complete.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percent(position: u64, total: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        (position.min(total) as f64) / (total as f64)
    }
}
