#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Street furniture dataset definitions and the row-to-feature pipeline.
//!
//! Each dataset is described by a [`source_def::DatasetDefinition`] that
//! declares which source columns feed which logical field. The loader
//! composes three pipeline pieces:
//!
//! * [`parsing`] turns delimited text into [`RawRow`]s,
//! * [`coordinates`] validates and repairs coordinate pairs,
//! * [`builder`] assembles the final [`madrid_map_feature_models::Feature`].
//!
//! [`RawRow`]: madrid_map_source_models::RawRow

pub mod builder;
pub mod coordinates;
pub mod fetch;
pub mod parsing;
pub mod progress;
pub mod registry;
pub mod source_def;

/// Errors raised while retrieving a dataset payload.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed (connection error or non-success status).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading a local file failed.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that could not be read.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The fetcher has no resource by that name.
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Requested resource name.
        resource: String,
    },
}

/// Errors raised when a payload cannot be parsed at all.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Headers were declared but the payload has no header line.
    #[error("payload has no header row")]
    MissingHeader,

    /// The CSV reader failed before yielding any row.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors raised when a payload's header does not match the dataset's
/// declared field mapping.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// None of the declared candidate columns exist in the header.
    #[error("none of the columns {candidates:?} for {field} found in header {header:?}")]
    MissingColumn {
        /// Logical field being resolved.
        field: &'static str,
        /// Declared candidate column names.
        candidates: Vec<String>,
        /// Columns actually present.
        header: Vec<String>,
    },
}
