//! Error sink: where user-visible notices go.

use std::sync::{Arc, Mutex, PoisonError};

use madrid_map_ingest_models::{Notice, Severity};

/// Receives fatal and non-fatal notices raised during a load.
pub trait ErrorSink: Send + Sync {
    /// Delivers one notice.
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log.
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Fatal => log::error!("{}: {}", notice.title, notice.message),
            Severity::Warning => log::warn!("{}: {}", notice.title, notice.message),
        }
    }
}

/// Returns a shared [`LogErrorSink`].
#[must_use]
pub fn log_sink() -> Arc<dyn ErrorSink> {
    Arc::new(LogErrorSink)
}

/// Keeps every notice in memory for later display.
#[derive(Debug, Default)]
pub struct CollectingErrorSink {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingErrorSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ErrorSink for CollectingErrorSink {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
