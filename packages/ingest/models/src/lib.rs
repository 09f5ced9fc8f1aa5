#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Load result and notice types.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use madrid_map_feature_models::FeatureCategory;
use madrid_map_source_models::RejectionKind;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Outcome of loading one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    /// Dataset identifier.
    pub dataset_id: String,
    /// Human-readable dataset name.
    pub dataset_name: String,
    /// Category of every feature in the dataset.
    pub category: FeatureCategory,
    /// Rows read from the payload (blank rows excluded).
    pub rows: u64,
    /// Rows turned into features.
    pub accepted: u64,
    /// Discarded rows per reason.
    pub rejections: BTreeMap<RejectionKind, u64>,
    /// Accepted features whose district stayed `Unknown`.
    pub unresolved_districts: u64,
    /// Accepted features whose district came from the boundary index.
    pub located_by_boundary: u64,
    /// Chunks committed to the marker store.
    pub chunks: u64,
    /// Wall time spent on the dataset.
    pub duration: Duration,
}

impl DatasetSummary {
    /// Creates an empty summary for a dataset.
    #[must_use]
    pub fn new(
        dataset_id: impl Into<String>,
        dataset_name: impl Into<String>,
        category: FeatureCategory,
    ) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            dataset_name: dataset_name.into(),
            category,
            rows: 0,
            accepted: 0,
            rejections: BTreeMap::new(),
            unresolved_districts: 0,
            located_by_boundary: 0,
            chunks: 0,
            duration: Duration::ZERO,
        }
    }

    /// Tallies one discarded row.
    pub fn record_rejection(&mut self, kind: RejectionKind) {
        *self.rejections.entry(kind).or_insert(0) += 1;
    }

    /// Number of rows discarded for `kind`.
    #[must_use]
    pub fn rejected_for(&self, kind: RejectionKind) -> u64 {
        self.rejections.get(&kind).copied().unwrap_or(0)
    }

    /// Total discarded rows.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejections.values().sum()
    }

    /// Rows discarded by coordinate validation.
    #[must_use]
    pub fn coordinate_rejections(&self) -> u64 {
        self.rejections
            .iter()
            .filter(|(kind, _)| kind.is_coordinate())
            .map(|(_, count)| count)
            .sum()
    }
}

/// Outcome of a complete load across all configured datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    /// Per-dataset outcomes, in load order.
    pub datasets: Vec<DatasetSummary>,
    /// Wall time of the whole load.
    pub duration: Duration,
}

impl LoadSummary {
    /// Features committed across all datasets.
    #[must_use]
    pub fn accepted(&self) -> u64 {
        self.datasets.iter().map(|d| d.accepted).sum()
    }

    /// Rows discarded across all datasets.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.datasets.iter().map(DatasetSummary::rejected).sum()
    }

    /// Rows discarded by coordinate validation across all datasets.
    #[must_use]
    pub fn coordinate_rejections(&self) -> u64 {
        self.datasets
            .iter()
            .map(DatasetSummary::coordinate_rejections)
            .sum()
    }

    /// Features left with an `Unknown` district across all datasets.
    #[must_use]
    pub fn unresolved_districts(&self) -> u64 {
        self.datasets.iter().map(|d| d.unresolved_districts).sum()
    }

    /// Multi-line human-readable report of rejected rows and unresolved
    /// districts, or `None` if every row was accepted cleanly.
    #[must_use]
    pub fn rejection_report(&self) -> Option<String> {
        if self.rejected() == 0 && self.unresolved_districts() == 0 {
            return None;
        }

        let mut report = String::new();
        for dataset in &self.datasets {
            let _ = write!(
                report,
                "{}: {} of {} rows accepted",
                dataset.dataset_name, dataset.accepted, dataset.rows
            );
            for (kind, count) in &dataset.rejections {
                let _ = write!(report, ", {count} {kind}");
            }
            if dataset.unresolved_districts > 0 {
                let _ = write!(
                    report,
                    ", {} with unresolved district",
                    dataset.unresolved_districts
                );
            }
            report.push('\n');
        }
        let _ = write!(
            report,
            "Total: {} rows rejected, {} for invalid coordinates, {} with unresolved district",
            self.rejected(),
            self.coordinate_rejections(),
            self.unresolved_districts()
        );
        Some(report)
    }
}

/// How serious a notice is.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// The load was aborted.
    Fatal,
    /// Something was skipped or degraded; the load continued.
    Warning,
}

/// A user-visible message sent to the error sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// How serious the notice is.
    pub severity: Severity,
    /// Short headline.
    pub title: String,
    /// Details.
    pub message: String,
}

impl Notice {
    /// A notice for an aborted load.
    #[must_use]
    pub fn fatal(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fatal,
            title: title.into(),
            message: message.into(),
        }
    }

    /// A notice for a degraded but completed operation.
    #[must_use]
    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            title: title.into(),
            message: message.into(),
        }
    }
}
