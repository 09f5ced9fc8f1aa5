//! Plain-text tables for the CLI.

use std::fmt::Write as _;

use madrid_map_analytics_models::StatisticsSnapshot;
use madrid_map_ingest_models::LoadSummary;
use madrid_map_source::source_def::DatasetDefinition;

const RULE_WIDTH: usize = 60;

/// Lists the configured datasets.
#[must_use]
pub fn format_datasets(datasets: &[DatasetDefinition]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<18} {:<16} {:<24} RESOURCE", "ID", "CATEGORY", "NAME");
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH + 20));
    for def in datasets {
        let _ = writeln!(
            out,
            "{:<18} {:<16} {:<24} {}",
            def.id(),
            def.category.to_string(),
            def.name(),
            def.resource
        );
    }
    out
}

/// Per-dataset load outcome.
#[must_use]
pub fn format_summary(summary: &LoadSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<18} {:>7} {:>8} {:>8} {:>8} {:>6}",
        "DATASET", "ROWS", "ACCEPTED", "SKIPPED", "UNKNOWN", "CHUNKS"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    for dataset in &summary.datasets {
        let _ = writeln!(
            out,
            "{:<18} {:>7} {:>8} {:>8} {:>8} {:>6}",
            dataset.dataset_id,
            dataset.rows,
            dataset.accepted,
            dataset.rejected(),
            dataset.unresolved_districts,
            dataset.chunks
        );
    }
    let _ = writeln!(
        out,
        "Loaded {} features in {:.1}s",
        summary.accepted(),
        summary.duration.as_secs_f64()
    );
    out
}

/// Visible counts by category, district and neighborhood.
#[must_use]
pub fn format_snapshot(snapshot: &StatisticsSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Visible features: {} ({} hidden)",
        snapshot.total, snapshot.hidden
    );

    let _ = writeln!(out, "\n{:<30} {:>8}", "CATEGORY", "COUNT");
    let _ = writeln!(out, "{}", "-".repeat(39));
    for (category, count) in &snapshot.by_category {
        let _ = writeln!(out, "{:<30} {count:>8}", category.label());
    }

    let _ = writeln!(out, "\n{:<30} {:>8}", "DISTRICT", "COUNT");
    let _ = writeln!(out, "{}", "-".repeat(39));
    for (district, count) in &snapshot.by_district {
        let _ = writeln!(out, "{:<30} {count:>8}", district.name());
    }

    if !snapshot.by_neighborhood.is_empty() {
        let _ = writeln!(out, "\n{:<30} {:>8}", "NEIGHBORHOOD", "COUNT");
        let _ = writeln!(out, "{}", "-".repeat(39));
        for (neighborhood, count) in &snapshot.by_neighborhood {
            let _ = writeln!(out, "{neighborhood:<30} {count:>8}");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use madrid_map_feature_models::{District, FeatureCategory};
    use madrid_map_ingest_models::DatasetSummary;
    use madrid_map_source::registry::all_datasets;
    use madrid_map_source_models::RejectionKind;

    use super::*;

    #[test]
    fn snapshot_table_lists_non_zero_buckets() {
        let snapshot = StatisticsSnapshot {
            total: 3,
            hidden: 1,
            by_category: BTreeMap::from([
                (FeatureCategory::TrafficLight, 2),
                (FeatureCategory::Streetlight, 1),
            ]),
            by_district: BTreeMap::from([(District::Centro, 2), (District::Unknown, 1)]),
            by_district_category: BTreeMap::new(),
            by_neighborhood: BTreeMap::from([("Sol".to_string(), 1)]),
        };

        let table = format_snapshot(&snapshot);
        assert!(table.starts_with("Visible features: 3 (1 hidden)"));
        assert!(table.contains("Traffic lights"));
        assert!(table.contains("Unknown"));
        assert!(table.contains("Sol"));
        assert!(!table.contains("Acoustic"));
    }

    #[test]
    fn summary_table_has_one_line_per_dataset() {
        let mut dataset =
            DatasetSummary::new("streetlights", "Alumbrado público", FeatureCategory::Streetlight);
        dataset.rows = 10;
        dataset.accepted = 9;
        dataset.record_rejection(RejectionKind::OutOfRegion);
        let summary = LoadSummary {
            datasets: vec![dataset],
            ..LoadSummary::default()
        };

        let table = format_summary(&summary);
        assert_eq!(table.lines().count(), 4);
        assert!(table.lines().nth(2).unwrap().starts_with("streetlights"));
        assert!(table.contains("Loaded 9 features"));
    }

    #[test]
    fn dataset_table_lists_every_definition() {
        let table = format_datasets(&all_datasets());
        assert!(table.contains("traffic_lights"));
        assert!(table.contains("alumbrado_publico.csv"));
        assert!(table.contains("ACOUSTIC_SIGNAL"));
    }
}
